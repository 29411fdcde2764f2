//! Status enums for catalog and sales entities.

use serde::{Deserialize, Serialize};

/// Generates `Display` and `FromStr` for a unit-only enum using its
/// `snake_case` wire names.
macro_rules! impl_status_strings {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Wire name of this status.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

/// Listing status of a product.
///
/// Only the governance pipeline moves a product between these states; see
/// [`crate::governance::workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Newly created, not yet offered for sale.
    #[default]
    Draft,
    /// Previously blocked listing that now passes compliance and waits for a human.
    PendingReview,
    /// Listed for sale.
    Active,
    /// Failed compliance.
    Blocked,
}

impl_status_strings!(ProductStatus, "product status", {
    Draft => "draft",
    PendingReview => "pending_review",
    Active => "active",
    Blocked => "blocked",
});

/// Sale lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sale_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl_status_strings!(SaleStatus, "sale status", {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    PayPal,
    BankTransfer,
    Cash,
    DigitalWallet,
    Cryptocurrency,
}

impl_status_strings!(PaymentMethod, "payment method", {
    CreditCard => "credit_card",
    DebitCard => "debit_card",
    PayPal => "pay_pal",
    BankTransfer => "bank_transfer",
    Cash => "cash",
    DigitalWallet => "digital_wallet",
    Cryptocurrency => "cryptocurrency",
});

/// Payment processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

impl_status_strings!(PaymentStatus, "payment status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
    Cancelled => "cancelled",
});
