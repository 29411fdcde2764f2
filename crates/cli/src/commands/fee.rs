use emporium_core::analytics::format_currency;
use emporium_core::governance::{self, Dimensions};

use super::CommandError;

/// Print the fulfillment fee for a package.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` for negative or non-finite values.
pub fn run(weight: f64, length: f64, width: f64, height: f64) -> Result<(), CommandError> {
    let dimensions = Dimensions::new(weight, length, width, height);
    if !dimensions.is_valid() {
        return Err(CommandError::InvalidInput(
            "weight and dimensions must be finite and non-negative".to_string(),
        ));
    }

    let fee = governance::estimate_fee(&dimensions);

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Billable weight: {:.2} lb (dimensional {:.2} lb)",
            dimensions.billable_weight(),
            dimensions.dimensional_weight()
        );
        println!("Fulfillment fee: {}", format_currency(fee));
    }
    Ok(())
}
