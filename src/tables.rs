use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{policy::ChargePolicy, record::PriceRecord},
    quantity::percent::Percent,
};

pub fn build_prices_table(records: &[PriceRecord], vat: Percent, policy: ChargePolicy) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec!["Date", "Start", "Wholesale", "Consumer"]);
    for record in records {
        let price = record.price.to_cents_per_kwh(vat).round();
        table.add_row(vec![
            Cell::new(record.timestamp.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(record.timestamp.format("%H:%M")),
            Cell::new(record.price).set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
            Cell::new(price).set_alignment(CellAlignment::Right).fg(
                if policy.decide(price, false).is_some() { Color::Green } else { Color::Red },
            ),
        ]);
    }
    table
}
