//! Plain-text rendering of the products table.

use std::fmt::Write as _;

use client_core::ProductRow;
use shared::domain::ProductField;

const HEADERS: [&str; 7] = [
    "No",
    "Name",
    "Price",
    "Description",
    "Category",
    "Stock",
    "Option",
];

fn cells(row: &ProductRow) -> [String; 7] {
    let number = row.number.to_string();
    match &row.editing {
        Some(scratch) => [
            number,
            format!("[{}]", scratch.get(ProductField::Name)),
            format!("[{}]", scratch.get(ProductField::Price)),
            format!("[{}]", scratch.get(ProductField::Description)),
            format!("[{}]", scratch.get(ProductField::Category)),
            format!("[{}]", scratch.get(ProductField::Stock)),
            "Save".to_string(),
        ],
        None => [
            number,
            row.product.name.clone(),
            row.product.price.to_string(),
            row.product.description.clone(),
            row.product.category.clone(),
            row.product.stock.to_string(),
            "Edit | Delete".to_string(),
        ],
    }
}

pub fn render_table(rows: &[ProductRow]) -> String {
    let body: Vec<[String; 7]> = rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_line(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for cells in &body {
        write_line(&mut out, cells, &widths);
    }
    if body.is_empty() {
        out.push_str("(no products)\n");
    }
    out
}

fn write_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}
