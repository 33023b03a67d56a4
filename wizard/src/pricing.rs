//! Summary and price aggregation
//!
//! `total = Σ quantity × (custom_price or base_price)`, computed separately
//! for packages (PRODUCT steps) and add-ons (ADDON steps) and then summed.
//! Selected ids that no step offers contribute nothing.

use crate::form::{BookingFormData, ProductKind, Selection};
use crate::validity::product_kind;
use bookflow_client::{Money, ProductConfig, ProductId, ProductItem, SelectionMode, Step};
use thiserror::Error;

/// A selection change the step's configuration does not allow
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// The product is not in this step's catalog
    #[error("Product {0} is not offered on this step")]
    NotOffered(ProductId),

    /// MULTIPLE mode already holds `max_selection` items
    #[error("At most {max} items can be selected on this step")]
    LimitReached {
        /// The step's `max_selection`
        max: u32,
    },
}

/// One selected item as shown on the summary step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryLine {
    /// Catalog product
    pub product: ProductId,
    /// Product name
    pub name: String,
    /// Effective description
    pub description: String,
    /// Effective unit price
    pub unit_price: Money,
    /// Selected quantity
    pub quantity: u32,
    /// `unit_price × quantity`
    pub line_total: Money,
    /// Package or add-on
    pub kind: ProductKind,
}

/// Apply "set `product` to `quantity`" to a selection, honoring the step's rules
///
/// SINGLE mode replaces whatever this step had selected; MULTIPLE mode
/// refuses new items beyond `max_selection`. A quantity of zero removes
/// the item.
///
/// # Errors
///
/// Returns [`SelectionError`] if the product is not offered or the limit is reached.
pub fn apply_selection(
    config: &ProductConfig,
    selection: &mut Selection,
    product: ProductId,
    quantity: u32,
) -> Result<(), SelectionError> {
    if config.item(product).is_none() {
        return Err(SelectionError::NotOffered(product));
    }

    if quantity == 0 {
        selection.remove(&product);
        return Ok(());
    }

    match config.selection_mode {
        SelectionMode::Single => {
            selection.retain(|id, _| config.item(*id).is_none());
        },
        SelectionMode::Multiple => {
            if let Some(max) = config.max_selection {
                let in_step = selection
                    .keys()
                    .filter(|id| config.item(**id).is_some())
                    .count();
                if !selection.contains_key(&product) && in_step >= max as usize {
                    return Err(SelectionError::LimitReached { max });
                }
            }
        },
    }

    selection.insert(product, quantity);
    Ok(())
}

fn find_item(steps: &[Step], kind: ProductKind, product: ProductId) -> Option<&ProductItem> {
    steps
        .iter()
        .filter(|step| product_kind(&step.kind) == Some(kind))
        .filter_map(Step::product_config)
        .find_map(|config| config.item(product))
}

/// Total of one selection against the steps of `kind`
#[must_use]
pub fn subtotal(steps: &[Step], selection: &Selection, kind: ProductKind) -> Money {
    selection
        .iter()
        .map(|(product, quantity)| {
            find_item(steps, kind, *product)
                .map_or(Money::ZERO, |item| item.unit_price().times(*quantity))
        })
        .sum()
}

/// Packages plus add-ons
#[must_use]
pub fn total(steps: &[Step], form: &BookingFormData) -> Money {
    subtotal(steps, &form.selected_packages, ProductKind::Package)
        + subtotal(steps, &form.selected_addons, ProductKind::Addon)
}

/// Amount due as a deposit: `percentage`% of `total`, or all of it
#[must_use]
pub fn deposit(total: Money, percentage: Option<u8>) -> Money {
    percentage.map_or(total, |pct| total.percent(pct.min(100)))
}

/// Lines for the summary step: packages first, then add-ons
#[must_use]
pub fn summary_lines(steps: &[Step], form: &BookingFormData) -> Vec<SummaryLine> {
    [ProductKind::Package, ProductKind::Addon]
        .into_iter()
        .flat_map(|kind| {
            form.selection(kind)
                .iter()
                .filter_map(move |(product, quantity)| {
                    let item = find_item(steps, kind, *product)?;
                    Some(SummaryLine {
                        product: *product,
                        name: item.product.name.clone(),
                        description: item.description().to_string(),
                        unit_price: item.unit_price(),
                        quantity: *quantity,
                        line_total: item.unit_price().times(*quantity),
                        kind,
                    })
                })
        })
        .collect()
}
