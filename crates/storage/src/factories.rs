//! Random test data for local development and tests.

use chrono::{Duration, Utc};
use rand::{seq::SliceRandom, Rng};
use shared::domain::{AddressId, ClientId, SaleId, SaleStatus, SellerId};

use crate::{CredentialHasher, NewAddress, NewClient, NewSale, NewSeller, Storage, StoreError};

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fabio", "Gabriela", "Heitor", "Isabela", "Joao",
    "Larissa", "Marcos", "Natalia", "Otavio", "Paula", "Rafael",
];
const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Costa", "Duarte", "Ferreira", "Gomes", "Lima", "Moreira", "Nunes",
    "Oliveira", "Pereira", "Ribeiro", "Santos", "Teixeira",
];
const STREETS: &[&str] = &[
    "Rua das Flores",
    "Avenida Paulista",
    "Rua Augusta",
    "Avenida Brasil",
    "Rua XV de Novembro",
    "Rua da Consolacao",
];
const CITIES: &[(&str, &str)] = &[
    ("Sao Paulo", "SP"),
    ("Rio de Janeiro", "RJ"),
    ("Belo Horizonte", "MG"),
    ("Curitiba", "PR"),
    ("Porto Alegre", "RS"),
    ("Salvador", "BA"),
    ("Recife", "PE"),
];
const COMPANY_SUFFIXES: &[&str] = &["Comercio", "Distribuidora", "Industria", "Servicos"];

/// Sale totals are drawn from this range, in cents.
pub const SALE_TOTAL_RANGE: std::ops::RangeInclusive<i64> = 10_000..=10_000_000;
/// Sales are dated at most this many years back.
pub const SALE_MAX_AGE_YEARS: i64 = 8;

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn person_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

pub fn fake_address<R: Rng + ?Sized>(rng: &mut R) -> NewAddress {
    let (city, state) = CITIES.choose(rng).copied().unwrap_or(("Sao Paulo", "SP"));
    NewAddress {
        street: format!("{}, {}", pick(rng, STREETS), rng.gen_range(1..=2000)),
        city: city.to_string(),
        state: state.to_string(),
        zip_code: format!("{:05}-{:03}", rng.gen_range(0..100_000), rng.gen_range(0..1000)),
    }
}

pub fn fake_seller<R: Rng + ?Sized>(rng: &mut R) -> NewSeller {
    NewSeller {
        name: person_name(rng),
        company: format!("{} {}", pick(rng, LAST_NAMES), pick(rng, COMPANY_SUFFIXES)),
        commission_rate_bps: rng.gen_range(100..=1500),
    }
}

/// Builds a client with a random password hashed by `hasher`. `sequence`
/// keeps emails unique within one seeding run.
pub fn fake_client<R: Rng + ?Sized>(
    rng: &mut R,
    hasher: &CredentialHasher,
    address_id: AddressId,
    sequence: u64,
) -> Result<NewClient, StoreError> {
    let name = person_name(rng);
    let local = name.to_lowercase().replace(' ', ".");
    let tag: u32 = rng.gen();
    let password: String = (0..16)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect();
    Ok(NewClient {
        name,
        email: format!("{local}.{tag:08x}.{sequence}@example.com"),
        credential: hasher.hash(&password)?,
        address_id,
    })
}

pub fn fake_sale<R: Rng + ?Sized>(rng: &mut R, seller_id: SellerId, client_id: ClientId) -> NewSale {
    let max_age_seconds = Duration::days(365 * SALE_MAX_AGE_YEARS).num_seconds();
    let sold_at = Utc::now() - Duration::seconds(rng.gen_range(0..=max_age_seconds));
    NewSale {
        seller_id,
        client_id,
        sold_at,
        total_amount: rng.gen_range(SALE_TOTAL_RANGE),
        status: SaleStatus::ALL
            .choose(rng)
            .copied()
            .unwrap_or(SaleStatus::Pending),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCounts {
    pub addresses: usize,
    pub sellers: usize,
    pub clients: usize,
    pub sales: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub addresses: Vec<AddressId>,
    pub sellers: Vec<SellerId>,
    pub clients: Vec<ClientId>,
    pub sales: Vec<SaleId>,
}

/// Fills the store with random rows. Clients need at least one address and
/// sales need at least one seller and one client; missing parents are created.
pub async fn seed<R: Rng + ?Sized>(
    storage: &Storage,
    rng: &mut R,
    hasher: &CredentialHasher,
    counts: SeedCounts,
) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    let clients = if counts.sales > 0 {
        counts.clients.max(1)
    } else {
        counts.clients
    };
    let addresses = if clients > 0 {
        counts.addresses.max(1)
    } else {
        counts.addresses
    };
    let sellers = if counts.sales > 0 {
        counts.sellers.max(1)
    } else {
        counts.sellers
    };

    for _ in 0..addresses {
        report
            .addresses
            .push(storage.create_address(&fake_address(rng)).await?);
    }

    for sequence in 0..clients {
        let address_id = *report
            .addresses
            .choose(rng)
            .ok_or_else(|| StoreError::decode("seed", "no address to attach client to"))?;
        let client = fake_client(rng, hasher, address_id, sequence as u64)?;
        report
            .clients
            .push(storage.create_client_aggregate(&client).await?);
    }

    for _ in 0..sellers {
        report
            .sellers
            .push(storage.create_seller(&fake_seller(rng)).await?);
    }

    for _ in 0..counts.sales {
        let (Some(&seller_id), Some(&client_id)) =
            (report.sellers.choose(rng), report.clients.choose(rng))
        else {
            break;
        };
        report
            .sales
            .push(storage.create_sale(&fake_sale(rng, seller_id, client_id)).await?);
    }

    Ok(report)
}

#[cfg(test)]
#[path = "tests/factories_tests.rs"]
mod tests;
