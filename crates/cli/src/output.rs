//! Plain-text rendering for command results.
//!
//! Results go to stdout; logs go to stderr so output stays pipeable.

use std::io::{self, Write};

use carpet_core::{
    CartLines, CurrencyCode, Price, Product, SavedAddress, SavedOrder, WishlistEntries,
};
use rust_decimal::Decimal;

pub fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

pub fn line(text: impl std::fmt::Display) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{text}")
}

pub fn products(list: &[Product], currency: CurrencyCode) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if list.is_empty() {
        return writeln!(out, "No products found.");
    }
    for product in list {
        let stock = if product.in_stock { "" } else { "  (out of stock)" };
        writeln!(
            out,
            "{:<26} {:<40} {:>12}{stock}",
            product.id,
            product.name,
            money(product.selling_price(), currency)
        )?;
    }
    Ok(())
}

pub fn product(product: &Product, currency: CurrencyCode) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", product.name)?;
    writeln!(out, "  id:        {}", product.id)?;
    write!(out, "  price:     {}", money(product.selling_price(), currency))?;
    match product.mrp {
        Some(mrp) if mrp > product.selling_price() => {
            writeln!(out, " (MRP {})", money(mrp, currency))?;
        }
        _ => writeln!(out)?,
    }
    let details = [
        ("category", &product.category),
        ("material", &product.material),
        ("size", &product.size),
        ("color", &product.color),
        ("origin", &product.country_of_origin),
    ];
    for (label, value) in details {
        if let Some(value) = value {
            writeln!(out, "  {label:<10} {value}")?;
        }
    }
    if let Some(description) = &product.description {
        writeln!(out)?;
        writeln!(out, "{description}")?;
    }
    Ok(())
}

pub fn cart(lines: &CartLines, currency: CurrencyCode) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if lines.is_empty() {
        return writeln!(out, "Your cart is empty.");
    }
    for item in lines.iter() {
        writeln!(
            out,
            "{:<26} {:<34} {:>3} × {:>10} = {:>12}",
            item.product_id,
            item.name,
            item.quantity,
            money(item.price, currency),
            money(item.line_total(), currency)
        )?;
    }
    writeln!(
        out,
        "{} item(s), subtotal {}",
        lines.total_quantity(),
        money(lines.subtotal(), currency)
    )
}

pub fn wishlist(entries: &WishlistEntries, currency: CurrencyCode) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if entries.is_empty() {
        return writeln!(out, "Your wishlist is empty.");
    }
    for item in entries.iter() {
        writeln!(
            out,
            "{:<26} {:<40} {:>12}",
            item.product_id,
            item.name,
            money(item.price, currency)
        )?;
    }
    Ok(())
}

pub fn addresses(list: &[SavedAddress]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if list.is_empty() {
        return writeln!(out, "No saved addresses.");
    }
    for address in list {
        writeln!(out, "{}  [{}] {}", address.id, address.label, address.one_line())?;
    }
    Ok(())
}

pub fn orders(list: &[SavedOrder], currency: CurrencyCode) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if list.is_empty() {
        return writeln!(out, "No orders yet.");
    }
    for order in list {
        writeln!(
            out,
            "{}  {}  {:<9} {} item(s)  {}",
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.id,
            order.status,
            order.item_count(),
            money(order.subtotal, currency)
        )?;
    }
    Ok(())
}
