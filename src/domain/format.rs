// Presentation formatting shared by KPI and table output
use super::settings::DataFormat;
use chrono::{DateTime, FixedOffset};

pub const MISSING: &str = "-";

/// Upper bound on displayed decimals, the same range `toFixed` accepts.
pub const MAX_DECIMALS: u32 = 100;

/// Fixed-decimal rendering; `None` and non-finite values render as `-`.
pub fn format_number(value: Option<f64>, format: DataFormat, decimals: u32) -> String {
    let Some(n) = value.filter(|n| n.is_finite()) else {
        return MISSING.to_string();
    };
    let decimals = decimals.min(MAX_DECIMALS) as usize;

    match format {
        DataFormat::Number => format!("{:.*}", decimals, n),
        DataFormat::Currency if n < 0.0 => format!("-${:.*}", decimals, -n),
        DataFormat::Currency => format!("${:.*}", decimals, n),
        DataFormat::Percentage => format!("{:.*}%", decimals, n),
    }
}

pub fn format_date(date: DateTime<FixedOffset>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Human label for the well-known order fields, otherwise the field name itself.
pub fn field_label(field: &str) -> String {
    let label = match field {
        "firstName" => "First name",
        "lastName" => "Last name",
        "emailId" => "Email id",
        "phoneNumber" => "Phone number",
        "streetAddress" => "Address",
        "city" => "City",
        "state" => "State",
        "postalCode" => "Postal code",
        "country" => "Country",
        "product" => "Category / Product",
        "quantity" => "Quantity",
        "unitPrice" => "Unit price",
        "totalAmount" => "Total amount",
        "status" => "Status",
        "createdBy" => "Created by",
        "orderDate" => "Order date",
        other => other,
    };
    label.to_string()
}

/// Columns rendered as money in tables.
pub fn is_currency_field(field: &str) -> bool {
    matches!(field, "totalAmount" | "unitPrice")
}

/// Columns rendered as calendar dates in tables.
pub fn is_date_field(field: &str) -> bool {
    field == "orderDate"
}
