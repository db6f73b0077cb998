use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use storage::{
    factories::{seed, SeedCounts},
    CredentialHasher, NewAddress, NewSeller, PageRequest, SalesCommission, Storage,
};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/sales_admin.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill the database with random addresses, sellers, clients and sales.
    Seed {
        #[arg(long, default_value_t = 5)]
        addresses: usize,
        #[arg(long, default_value_t = 3)]
        sellers: usize,
        #[arg(long, default_value_t = 10)]
        clients: usize,
        #[arg(long, default_value_t = 50)]
        sales: usize,
        /// Fixed RNG seed for reproducible data.
        #[arg(long)]
        rng_seed: Option<u64>,
    },
    CreateAddress {
        street: String,
        city: String,
        state: String,
        zip_code: String,
    },
    CreateSeller {
        name: String,
        company: String,
        #[arg(value_parser = clap::value_parser!(u16).range(0..=10_000))]
        commission_rate_bps: u16,
    },
    /// Print one page of the commission report as tab-separated rows.
    Report {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed {
            addresses,
            sellers,
            clients,
            sales,
            rng_seed,
        } => {
            let mut rng = match rng_seed {
                Some(value) => StdRng::seed_from_u64(value),
                None => StdRng::from_entropy(),
            };
            let report = seed(
                &storage,
                &mut rng,
                &CredentialHasher::default(),
                SeedCounts {
                    addresses,
                    sellers,
                    clients,
                    sales,
                },
            )
            .await
            .context("seeding failed")?;
            println!(
                "seeded addresses={} sellers={} clients={} sales={}",
                report.addresses.len(),
                report.sellers.len(),
                report.clients.len(),
                report.sales.len()
            );
        }
        Command::CreateAddress {
            street,
            city,
            state,
            zip_code,
        } => {
            let address_id = storage
                .create_address(&NewAddress {
                    street,
                    city,
                    state,
                    zip_code,
                })
                .await?;
            println!("created address_id={}", address_id.0);
        }
        Command::CreateSeller {
            name,
            company,
            commission_rate_bps,
        } => {
            let seller_id = storage
                .create_seller(&NewSeller {
                    name,
                    company,
                    commission_rate_bps,
                })
                .await?;
            println!("created seller_id={}", seller_id.0);
        }
        Command::Report { page } => {
            let report = storage
                .list_commission_report(PageRequest::new(page))
                .await?;
            println!("{}", SalesCommission::columns().join("\t"));
            for row in report.items {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    row.company,
                    row.seller,
                    row.client,
                    row.city,
                    row.state,
                    row.sold_at.to_rfc3339(),
                    row.status,
                    row.total_amount,
                    row.commission
                );
            }
            println!("page {} of {} ({} rows)", report.page, report.last_page, report.total);
        }
    }

    Ok(())
}
