//! Cart scenarios.
//!
//! A scenario is a YAML list of cart operations, written with fixture keys, replayed
//! against an in-memory store. Each step prints the resulting cart view; checkout prints
//! the order view and a receipt.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use jiff::Timestamp;
use platter::{fixtures::parse_price, prelude::*};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
    context::AppContext,
    domain::{carts::CartsServiceError, checkout::CheckoutError},
    views::{CartView, OrderView},
};

/// Errors from loading or running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// IO error reading the scenario or writing output
    #[error("scenario IO failed: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("failed to parse scenario YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Catalog fixture error
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// A cart operation failed
    #[error("step {step}: {source}")]
    Cart {
        /// Step number, from one
        step: usize,
        /// Service error
        source: CartsServiceError,
    },

    /// Checkout failed
    #[error("step {step}: {source}")]
    Checkout {
        /// Step number, from one
        step: usize,
        /// Service error
        source: CheckoutError,
    },

    /// A step referred to a line position the cart does not have
    #[error("step {step}: cart has no line {line}")]
    LineIndex {
        /// Step number, from one
        step: usize,
        /// Zero-based line position
        line: usize,
    },

    /// An expectation did not hold
    #[error("step {step}: expected {field} to be {expected}, got {actual}")]
    Expectation {
        /// Step number, from one
        step: usize,
        /// Field checked
        field: &'static str,
        /// Expected value
        expected: String,
        /// Actual value
        actual: String,
    },

    /// JSON rendering error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Receipt rendering error
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// Money arithmetic error
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// A named sequence of cart operations.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Display name
    pub name: String,

    /// Catalog fixture the scenario is written against
    pub catalog: String,

    /// Session the cart belongs to
    #[serde(default = "default_session")]
    pub session: String,

    /// Operations in order
    pub steps: Vec<Step>,
}

fn default_session() -> String {
    "scenario".to_string()
}

/// One cart operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Add a line by menu item key
    AddLine(LineStep),

    /// Change the line at a position
    UpdateLine(UpdateStep),

    /// Remove the line at a position
    RemoveLine {
        /// Zero-based line position
        line: usize,
    },

    /// Empty the cart
    ClearCart,

    /// Choose delivery or collection
    SetDeliveryType(DeliveryTypeStep),

    /// Apply a coupon code
    ApplyCoupon(String),

    /// Remove the applied coupon
    RemoveCoupon,

    /// Check the current cart totals
    Expect(Expectation),

    /// Finalise the cart
    Checkout(PaymentMethodStep),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::AddLine(_) => "add_line",
            Self::UpdateLine(_) => "update_line",
            Self::RemoveLine { .. } => "remove_line",
            Self::ClearCart => "clear_cart",
            Self::SetDeliveryType(_) => "set_delivery_type",
            Self::ApplyCoupon(_) => "apply_coupon",
            Self::RemoveCoupon => "remove_coupon",
            Self::Expect(_) => "expect",
            Self::Checkout(_) => "checkout",
        }
    }
}

/// A new line, by fixture keys.
#[derive(Debug, Deserialize)]
pub struct LineStep {
    /// Menu item key
    pub item: String,

    /// Quantity
    #[serde(default = "one")]
    pub quantity: u32,

    /// Option keys per group key
    #[serde(default)]
    pub options: FxHashMap<String, Vec<String>>,

    /// Special instructions
    #[serde(default)]
    pub instructions: Option<String>,
}

fn one() -> u32 {
    1
}

/// Changes to an existing line.
#[derive(Debug, Deserialize)]
pub struct UpdateStep {
    /// Zero-based line position
    pub line: usize,

    /// New quantity
    #[serde(default)]
    pub quantity: Option<u32>,

    /// Replacement option keys per group key
    #[serde(default)]
    pub options: Option<FxHashMap<String, Vec<String>>>,

    /// Replacement special instructions
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Delivery type as written in YAML.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTypeStep {
    /// Delivered
    Delivery,

    /// Collected
    Collection,
}

impl From<DeliveryTypeStep> for DeliveryType {
    fn from(step: DeliveryTypeStep) -> Self {
        match step {
            DeliveryTypeStep::Delivery => DeliveryType::Delivery,
            DeliveryTypeStep::Collection => DeliveryType::Collection,
        }
    }
}

/// Payment method as written in YAML.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodStep {
    /// Card
    Card,

    /// Cash
    Cash,
}

impl From<PaymentMethodStep> for PaymentMethod {
    fn from(step: PaymentMethodStep) -> Self {
        match step {
            PaymentMethodStep::Card => PaymentMethod::Card,
            PaymentMethodStep::Cash => PaymentMethod::Cash,
        }
    }
}

/// Totals to check, as price strings (e.g. `"20.70 GBP"`).
#[derive(Debug, Default, Deserialize)]
pub struct Expectation {
    /// Expected subtotal
    #[serde(default)]
    pub subtotal: Option<String>,

    /// Expected discount
    #[serde(default)]
    pub discount: Option<String>,

    /// Expected delivery fee
    #[serde(default)]
    pub delivery_fee: Option<String>,

    /// Expected total
    #[serde(default)]
    pub total: Option<String>,

    /// Expected number of lines
    #[serde(default)]
    pub lines: Option<usize>,

    /// Whether the delivery minimum is met
    #[serde(default)]
    pub delivery_met: Option<bool>,
}

impl Scenario {
    /// Load `<base>/scenarios/<name>.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(base: &Path, name: &str) -> Result<Self, ScenarioError> {
        let path = base.join("scenarios").join(format!("{name}.yml"));

        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parse scenario YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe a scenario.
    pub fn parse(contents: &str) -> Result<Self, ScenarioError> {
        Ok(serde_norway::from_str(contents)?)
    }
}

/// What a scenario left behind.
#[derive(Debug)]
pub struct Outcome {
    /// The cart after the last step
    pub cart: PricedCart,

    /// Orders placed, in order
    pub orders: Vec<Order>,
}

/// Replays a scenario step by step.
#[derive(Debug)]
struct Runner<'a, W> {
    ctx: AppContext,
    fixture: &'a Fixture,
    owner: CartOwner,
    out: W,
    line_items: FxHashMap<CartLineId, String>,
    orders: Vec<Order>,
}

/// Run `scenario` against a fresh in-memory store seeded from `fixture`, writing views and
/// receipts to `out`.
///
/// # Errors
///
/// Returns the first failing step.
pub async fn run(
    scenario: &Scenario,
    fixture: &Fixture,
    out: impl Write,
) -> Result<Outcome, ScenarioError> {
    info!(scenario = %scenario.name, steps = scenario.steps.len(), "running scenario");

    let mut runner = Runner {
        ctx: AppContext::in_memory(fixture),
        fixture,
        owner: CartOwner::Session(scenario.session.clone()),
        out,
        line_items: FxHashMap::default(),
        orders: Vec::new(),
    };

    for (index, step) in scenario.steps.iter().enumerate() {
        runner.step(index + 1, step).await?;
    }

    let cart = runner.current(0).await?;

    Ok(Outcome {
        cart,
        orders: runner.orders,
    })
}

impl<W: Write> Runner<'_, W> {
    async fn step(&mut self, number: usize, step: &Step) -> Result<(), ScenarioError> {
        let now = Timestamp::now();
        let owner = self.owner.clone();
        let carts = &self.ctx.carts;

        writeln!(self.out, "# {number}: {}", step.name())?;

        let priced = match step {
            Step::AddLine(line) => {
                let new_line = NewCartLine {
                    menu_item: self.fixture.menu_item(&line.item)?.id,
                    quantity: line.quantity,
                    selections: self.selections(&line.item, &line.options)?,
                    instructions: line.instructions.clone(),
                };

                let priced = carts
                    .add_line(owner, new_line, now)
                    .await
                    .map_err(|source| ScenarioError::Cart { step: number, source })?;

                if let Some(added) = priced.cart.lines.last() {
                    self.line_items.insert(added.id, line.item.clone());
                }

                priced
            }
            Step::UpdateLine(update) => {
                let line = self.line_at(number, update.line).await?;

                let selections = match (&update.options, self.line_items.get(&line)) {
                    (Some(options), Some(item)) => Some(self.selections(item, options)?),
                    _ => None,
                };

                carts
                    .update_line(
                        owner,
                        line,
                        CartLineUpdate {
                            quantity: update.quantity,
                            selections,
                            instructions: update.instructions.clone().map(Some),
                        },
                        now,
                    )
                    .await
                    .map_err(|source| ScenarioError::Cart { step: number, source })?
            }
            Step::RemoveLine { line } => {
                let line = self.line_at(number, *line).await?;

                carts
                    .remove_line(owner, line, now)
                    .await
                    .map_err(|source| ScenarioError::Cart { step: number, source })?
            }
            Step::ClearCart => carts
                .clear_cart(owner, now)
                .await
                .map_err(|source| ScenarioError::Cart { step: number, source })?,
            Step::SetDeliveryType(delivery_type) => carts
                .set_delivery_type(owner, (*delivery_type).into(), now)
                .await
                .map_err(|source| ScenarioError::Cart { step: number, source })?,
            Step::ApplyCoupon(code) => carts
                .apply_coupon(owner, code.clone(), now)
                .await
                .map_err(|source| ScenarioError::Cart { step: number, source })?,
            Step::RemoveCoupon => carts
                .remove_coupon(owner, now)
                .await
                .map_err(|source| ScenarioError::Cart { step: number, source })?,
            Step::Expect(expectation) => {
                let priced = self.current(number).await?;

                check(number, expectation, &priced)?;

                priced
            }
            Step::Checkout(payment_method) => {
                let order = self
                    .ctx
                    .checkout
                    .finalize(owner, (*payment_method).into(), now)
                    .await
                    .map_err(|source| ScenarioError::Checkout { step: number, source })?;

                serde_json::to_writer_pretty(&mut self.out, &OrderView::from_order(&order))?;
                writeln!(self.out)?;
                write_order_receipt(&mut self.out, &order, self.fixture.currency()?)?;

                self.orders.push(order);

                return Ok(());
            }
        };

        serde_json::to_writer_pretty(&mut self.out, &CartView::from_priced(&priced)?)?;
        writeln!(self.out)?;

        Ok(())
    }

    async fn current(&self, number: usize) -> Result<PricedCart, ScenarioError> {
        self.ctx
            .carts
            .get_cart(self.owner.clone(), Timestamp::now())
            .await
            .map_err(|source| ScenarioError::Cart { step: number, source })
    }

    async fn line_at(&self, number: usize, line: usize) -> Result<CartLineId, ScenarioError> {
        self.current(number)
            .await?
            .cart
            .lines
            .get(line)
            .map(|found| found.id)
            .ok_or(ScenarioError::LineIndex { step: number, line })
    }

    fn selections(
        &self,
        item: &str,
        options: &FxHashMap<String, Vec<String>>,
    ) -> Result<Vec<Selection>, ScenarioError> {
        let mut selections = Vec::with_capacity(options.len());

        for (group, keys) in options {
            let chosen = keys
                .iter()
                .map(|key| self.fixture.option(item, group, key))
                .collect::<Result<Vec<_>, _>>()?;

            selections.push(Selection::new(
                self.fixture.option_group(item, group)?,
                chosen,
            ));
        }

        Ok(selections)
    }
}

fn check(
    number: usize,
    expectation: &Expectation,
    priced: &PricedCart,
) -> Result<(), ScenarioError> {
    let amounts = [
        ("subtotal", &expectation.subtotal, priced.totals.subtotal),
        ("discount", &expectation.discount, priced.totals.discount),
        (
            "delivery_fee",
            &expectation.delivery_fee,
            priced.totals.delivery_fee,
        ),
        ("total", &expectation.total, priced.totals.total),
    ];

    for (field, expected, actual) in amounts {
        let Some(expected) = expected else {
            continue;
        };

        let (minor, _currency) = parse_price(expected)?;

        if minor != actual {
            return Err(ScenarioError::Expectation {
                step: number,
                field,
                expected: expected.clone(),
                actual: platter::money::to_decimal(actual).to_string(),
            });
        }
    }

    if let Some(expected) = expectation.lines
        && expected != priced.cart.lines.len()
    {
        return Err(ScenarioError::Expectation {
            step: number,
            field: "lines",
            expected: expected.to_string(),
            actual: priced.cart.lines.len().to_string(),
        });
    }

    if let Some(expected) = expectation.delivery_met {
        let actual = priced.delivery.is_none_or(|check| check.met);

        if expected != actual {
            return Err(ScenarioError::Expectation {
                step: number,
                field: "delivery_met",
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    Ok(())
}
