use super::status::TransactionType;

fn group_thousands(units: u64) -> String {
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    grouped
}

// Euro amount with a space thousands separator and `,` decimals,
// decimals are omitted when the amount is whole: `1 200,50 €`
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = group_thousands(abs / 100);

    match abs % 100 {
        0 => format!("{}{} €", sign, units),
        rest => format!("{}{},{:02} €", sign, units, rest),
    }
}

// Listing price label, rentals are monthly
pub fn format_price(cents: i64, transaction: TransactionType) -> String {
    match transaction {
        TransactionType::Sale => format_amount(cents),
        TransactionType::Rental => format!("{}/mois", format_amount(cents)),
    }
}
