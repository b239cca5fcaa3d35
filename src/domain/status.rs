// Enumerations stored as text columns

use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("{} is not a valid {}", other, stringify!($name)))
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(PropertyType {
    Apartment => "apartment",
    House => "house",
    Land => "land",
    Commercial => "commercial",
    Office => "office",
    Parking => "parking",
});

text_enum!(TransactionType {
    Sale => "sale",
    Rental => "rental",
});

text_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Completed => "completed",
});

text_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

text_enum!(PaymentMethod {
    Card => "card",
    BankTransfer => "bank_transfer",
});

impl OrderStatus {
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match (self, next) {
            (a, b) if *a == b => true,
            (Pending, Confirmed) | (Pending, Cancelled) => true,
            (Confirmed, Completed) | (Confirmed, Cancelled) => true,
            _ => false,
        }
    }

    // Seats of the order stay reserved in every other status
    pub fn holds_seats(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled)
    }
}
