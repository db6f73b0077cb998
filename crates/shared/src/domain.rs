use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ClientId);
id_newtype!(AddressId);
id_newtype!(SellerId);
id_newtype!(SaleId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Paid,
    Canceled,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 3] = [SaleStatus::Pending, SaleStatus::Paid, SaleStatus::Canceled];

    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Paid => "paid",
            SaleStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sale status '{0}'")]
pub struct UnknownSaleStatus(pub String);

impl FromStr for SaleStatus {
    type Err = UnknownSaleStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SaleStatus::Pending),
            "paid" => Ok(SaleStatus::Paid),
            "canceled" => Ok(SaleStatus::Canceled),
            other => Err(UnknownSaleStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSummary {
    pub address_id: AddressId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub client_id: ClientId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub address: AddressSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_status_text_matches_serde_names() {
        for status in SaleStatus::ALL {
            let json = serde_json::to_string(&status).expect("json");
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<SaleStatus>(), Ok(status));
        }
    }

    #[test]
    fn rejects_unknown_sale_status() {
        let err = "refunded".parse::<SaleStatus>().expect_err("unknown");
        assert_eq!(err, UnknownSaleStatus("refunded".into()));
    }
}
