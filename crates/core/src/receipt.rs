//! Receipt

use std::io;

use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    money::{AmountError, to_money},
    orders::{Order, OrderLine},
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for amount conversion errors.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Render `order` as a table of lines followed by a totals summary.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if an amount cannot be displayed or writing fails.
pub fn write_order_receipt(
    mut out: impl io::Write,
    order: &Order,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Qty", "Item", "Unit Price", "Options", "Total"]);

    for line in &order.lines {
        append_line_rows(&mut builder, line, currency)?;
    }

    let mut table = builder.build();

    table.with(Theme::from(Style::modern_rounded()));
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

    write_summary(&mut out, order, currency)
}

fn append_line_rows(
    builder: &mut Builder,
    line: &OrderLine,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let options_price = line.options.iter().map(|option| option.price).sum::<u64>();

    builder.push_record([
        line.quantity.to_string(),
        line.item_name.clone(),
        to_money(line.unit_price, currency)?.to_string(),
        to_money(options_price, currency)?.to_string(),
        to_money(line.total, currency)?.to_string(),
    ]);

    for option in &line.options {
        let price = if option.price == 0 {
            "free".to_string()
        } else {
            format!("+{}", to_money(option.price, currency)?)
        };

        builder.push_record([
            String::new(),
            format!("  {}: {}", option.group_name, option.name),
            String::new(),
            price,
            String::new(),
        ]);
    }

    if let Some(instructions) = &line.instructions {
        builder.push_record([
            String::new(),
            format!("  \"{instructions}\""),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }

    Ok(())
}

fn write_summary(
    out: &mut impl io::Write,
    order: &Order,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let totals = &order.totals;

    let discount_label = order
        .coupon
        .as_ref()
        .map_or_else(|| "Discount:".to_string(), |c| format!("Discount ({}):", c.code));

    let rows = [
        ("Subtotal:".to_string(), to_money(totals.subtotal, currency)?.to_string()),
        (discount_label, format!("-{}", to_money(totals.discount, currency)?)),
        (
            format!("Delivery ({}):", order.delivery_type.as_str()),
            to_money(totals.delivery_fee, currency)?.to_string(),
        ),
        ("Total:".to_string(), to_money(totals.total, currency)?.to_string()),
    ];

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| value.chars().count()).max().unwrap_or(0);

    for (label, value) in &rows {
        writeln!(out, " {label:>label_width$}  {value:>value_width$}")
            .map_err(|_err| ReceiptError::IO)?;
    }

    writeln!(
        out,
        " Status: {} / payment {} ({})",
        order.status,
        order.payment_status,
        order.payment_method.as_str()
    )
    .map_err(|_err| ReceiptError::IO)
}
