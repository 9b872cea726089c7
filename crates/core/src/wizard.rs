//! Configuration wizard: step catalog, typed step answers, and the
//! per-session step data they accumulate into.
//!
//! The wizard has eight fixed steps. Each submission is parsed at the
//! boundary into a [`StepAnswer`]; a failed parse yields a field -> message
//! map and nothing is stored. Accepted answers live in [`StepData`], keyed
//! `step_<n>` when serialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::configuration::{validate_name, SYSTEM_TYPE_KEY};
use crate::error::CoreError;
use crate::pricing::{configuration_total, fits_amount, round_cents, LineItem, MAX_AMOUNT};
use crate::selection::{field_problems, SelectionFields, COMPONENT_TYPE_MAX_LEN, UNTYPED_COMPONENT};

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: i32 = 8;

/// Minimum step number (1-based).
pub const MIN_STEP: i32 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: i32 = 8;

/// Alert text returned with the redirect for an out-of-range step.
pub const INVALID_STEP_ALERT: &str = "Invalid step.";

/// Flash text for a rejected submission.
pub const CORRECT_ERRORS_FLASH: &str = "Please correct the errors below.";

/// Field -> message map for one step.
pub type FieldErrors = BTreeMap<String, String>;

/// Stored validation errors, keyed `step_<n>`.
pub type StepErrors = BTreeMap<String, FieldErrors>;

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// Status values for a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    Active,
    Completed,
    Abandoned,
}

impl WizardStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(CoreError::Validation(format!(
                "Invalid wizard status '{s}'. Must be one of: active, completed, abandoned"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// The eight steps of the configuration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SystemType,
    SystemSpecifications,
    ComponentTypes,
    #[serde(rename = "component_selection_1")]
    ComponentSelection1,
    #[serde(rename = "component_selection_2")]
    ComponentSelection2,
    #[serde(rename = "component_selection_3")]
    ComponentSelection3,
    #[serde(rename = "component_selection_4")]
    ComponentSelection4,
    Review,
}

impl WizardStep {
    /// Every step in order.
    pub const ALL: [WizardStep; 8] = [
        Self::SystemType,
        Self::SystemSpecifications,
        Self::ComponentTypes,
        Self::ComponentSelection1,
        Self::ComponentSelection2,
        Self::ComponentSelection3,
        Self::ComponentSelection4,
        Self::Review,
    ];

    /// Convert a 1-based step number to a `WizardStep`.
    pub fn from_number(n: i32) -> Result<Self, CoreError> {
        if !(MIN_STEP..=MAX_STEP).contains(&n) {
            return Err(CoreError::InvalidStep(n.to_string()));
        }
        Ok(Self::ALL[(n - 1) as usize])
    }

    /// Parse a raw path segment. Anything that is not an integer in range
    /// is an invalid step.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let n: i32 = raw
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidStep(raw.to_string()))?;
        Self::from_number(n)
    }

    /// Convert to a 1-based step number.
    pub fn number(self) -> i32 {
        match self {
            Self::SystemType => 1,
            Self::SystemSpecifications => 2,
            Self::ComponentTypes => 3,
            Self::ComponentSelection1 => 4,
            Self::ComponentSelection2 => 5,
            Self::ComponentSelection3 => 6,
            Self::ComponentSelection4 => 7,
            Self::Review => 8,
        }
    }

    /// Machine name of the step.
    pub fn name(self) -> &'static str {
        match self {
            Self::SystemType => "system_type",
            Self::SystemSpecifications => "system_specifications",
            Self::ComponentTypes => "component_types",
            Self::ComponentSelection1 => "component_selection_1",
            Self::ComponentSelection2 => "component_selection_2",
            Self::ComponentSelection3 => "component_selection_3",
            Self::ComponentSelection4 => "component_selection_4",
            Self::Review => "review",
        }
    }

    /// Human-readable title for the step.
    pub fn title(self) -> &'static str {
        match self {
            Self::SystemType => "System Type Selection",
            Self::SystemSpecifications => "System Specifications",
            Self::ComponentTypes => "Component Type Selection",
            Self::ComponentSelection1 => "Component Selection 1",
            Self::ComponentSelection2 => "Component Selection 2",
            Self::ComponentSelection3 => "Component Selection 3",
            Self::ComponentSelection4 => "Component Selection 4",
            Self::Review => "Review and Complete",
        }
    }

    /// One-line instruction shown with the step.
    pub fn description(self) -> &'static str {
        match self {
            Self::SystemType => "Choose the type of conveyor system you want to configure",
            Self::SystemSpecifications => "Specify the system parameters and requirements",
            Self::ComponentTypes => "Select the types of components you need",
            Self::ComponentSelection1 => "Choose the first component type",
            Self::ComponentSelection2 => "Choose the second component type",
            Self::ComponentSelection3 => "Choose the third component type",
            Self::ComponentSelection4 => "Choose the fourth component type",
            Self::Review => "Review your configuration and complete the setup",
        }
    }

    /// Key of this step's bucket in serialized step data.
    pub fn data_key(self) -> String {
        format!("step_{}", self.number())
    }

    /// Progress through the wizard when this step is current.
    pub fn progress_percentage(self) -> i32 {
        progress_percentage(self.number())
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1).ok()
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1).ok()
    }

    /// For steps 4 to 7, the index into the chosen component types that
    /// the step selects components for.
    pub fn component_slot(self) -> Option<usize> {
        match self {
            Self::ComponentSelection1 => Some(0),
            Self::ComponentSelection2 => Some(1),
            Self::ComponentSelection3 => Some(2),
            Self::ComponentSelection4 => Some(3),
            _ => None,
        }
    }
}

/// `round(step / 8 * 100)`.
pub fn progress_percentage(step: i32) -> i32 {
    ((f64::from(step) / f64::from(TOTAL_STEPS)) * 100.0).round() as i32
}

/// Marketing description of a system type.
pub fn system_type_description(system_type: &str) -> &'static str {
    match system_type {
        "belt_conveyor" => "Standard belt conveyor system for general material handling",
        "roller_conveyor" => "Roller-based system for heavy-duty applications",
        "chain_conveyor" => "Chain-driven system for high-capacity operations",
        "screw_conveyor" => "Screw-based system for bulk material handling",
        "pneumatic_conveyor" => "Air-powered system for fine material transport",
        "modular_belt" => "Modular plastic belt system for food and packaging",
        "overhead_conveyor" => "Suspended system for space-efficient transport",
        "vertical_conveyor" => "Lift system for multi-level operations",
        _ => "Custom conveyor system configuration",
    }
}

// ---------------------------------------------------------------------------
// Backward-edit policy
// ---------------------------------------------------------------------------

/// What happens to later answers when an earlier step is re-submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackwardEditPolicy {
    /// Later answers are kept as they are.
    #[default]
    Retain,
    /// A changed answer discards every later answer.
    Invalidate,
}

impl BackwardEditPolicy {
    pub fn from_str_config(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "invalidate" => Ok(Self::Invalidate),
            other => Err(CoreError::Validation(format!(
                "Invalid backward edit policy '{other}'. Must be one of: retain, invalidate"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retain => "retain",
            Self::Invalidate => "invalidate",
        }
    }
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTypeAnswer {
    pub system_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSpecificationsAnswer {
    pub system_specifications: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTypesAnswer {
    pub component_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSelectionAnswer {
    pub selected_components: Vec<WizardSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAnswer {
    pub configuration_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A component picked in one of the selection steps, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSelection {
    pub component_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_code: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

impl LineItem for WizardSelection {
    fn unit_price(&self) -> Option<f64> {
        self.price
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// A validated answer for one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAnswer {
    SystemType(SystemTypeAnswer),
    SystemSpecifications(SystemSpecificationsAnswer),
    ComponentTypes(ComponentTypesAnswer),
    ComponentSelection(ComponentSelectionAnswer),
    Review(ReviewAnswer),
}

impl StepAnswer {
    /// Parse and validate a submitted payload for `step`.
    ///
    /// `assigned_component_type` is the component type the step selects
    /// for (steps 4 to 7); selections without their own type inherit it.
    pub fn parse(
        step: WizardStep,
        payload: &Value,
        assigned_component_type: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let Some(obj) = payload.as_object() else {
            return Err(single_error("base", "must be an object"));
        };

        match step {
            WizardStep::SystemType => match non_blank_str(obj.get("system_type")) {
                Some(system_type) => Ok(Self::SystemType(SystemTypeAnswer { system_type })),
                None => Err(single_error("system_type", "can't be blank")),
            },
            WizardStep::SystemSpecifications => match obj.get("system_specifications") {
                Some(v) if is_present(v) => {
                    Ok(Self::SystemSpecifications(SystemSpecificationsAnswer {
                        system_specifications: v.clone(),
                    }))
                }
                _ => Err(single_error("system_specifications", "can't be blank")),
            },
            WizardStep::ComponentTypes => parse_component_types(obj.get("component_types")),
            WizardStep::ComponentSelection1
            | WizardStep::ComponentSelection2
            | WizardStep::ComponentSelection3
            | WizardStep::ComponentSelection4 => {
                parse_selected_components(obj.get("selected_components"), assigned_component_type)
            }
            WizardStep::Review => parse_review(obj),
        }
    }

    /// JSON form of the answer, as stored in its step bucket.
    pub fn to_json(&self) -> Value {
        let result = match self {
            Self::SystemType(a) => serde_json::to_value(a),
            Self::SystemSpecifications(a) => serde_json::to_value(a),
            Self::ComponentTypes(a) => serde_json::to_value(a),
            Self::ComponentSelection(a) => serde_json::to_value(a),
            Self::Review(a) => serde_json::to_value(a),
        };
        result.unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

fn single_error(field: &str, message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), message.to_string());
    errors
}

/// Presence in the sense of a non-blank value: not null, not false, not an
/// empty or whitespace string, not an empty array or object.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(true) | Value::Number(_) => true,
    }
}

fn non_blank_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A string or number rendered as an opaque id.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_component_types(value: Option<&Value>) -> Result<StepAnswer, FieldErrors> {
    let Some(Value::Array(items)) = value else {
        return Err(single_error("component_types", "must be a list of component types"));
    };
    if items.is_empty() {
        return Err(single_error(
            "component_types",
            "must include at least one component type",
        ));
    }

    let mut component_types = Vec::with_capacity(items.len());
    for item in items {
        match non_blank_str(Some(item)) {
            Some(t) if t.chars().count() > COMPONENT_TYPE_MAX_LEN => {
                return Err(single_error(
                    "component_types",
                    &format!("must contain names of at most {COMPONENT_TYPE_MAX_LEN} characters"),
                ))
            }
            Some(t) => component_types.push(t),
            None => {
                return Err(single_error(
                    "component_types",
                    "must contain only non-blank names",
                ))
            }
        }
    }
    Ok(StepAnswer::ComponentTypes(ComponentTypesAnswer { component_types }))
}

fn parse_selected_components(
    value: Option<&Value>,
    assigned_component_type: Option<&str>,
) -> Result<StepAnswer, FieldErrors> {
    let Some(Value::Array(items)) = value else {
        return Err(single_error(
            "selected_components",
            "must be a list of components",
        ));
    };
    if items.is_empty() {
        return Err(single_error(
            "selected_components",
            "must include at least one component",
        ));
    }

    let mut errors = FieldErrors::new();
    let mut selected = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match parse_selection(item, assigned_component_type) {
            Ok(selection) => selected.push(selection),
            Err(problems) => {
                for (field, message) in problems {
                    errors
                        .entry(format!("selected_components[{i}].{field}"))
                        .or_insert(message);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(StepAnswer::ComponentSelection(ComponentSelectionAnswer {
            selected_components: selected,
        }))
    } else {
        Err(errors)
    }
}

/// Parse one picked component. The result satisfies the same field rules
/// as a selection added directly to a configuration; prices are kept to
/// cents.
fn parse_selection(
    item: &Value,
    assigned_component_type: Option<&str>,
) -> Result<WizardSelection, Vec<(&'static str, String)>> {
    let selection = read_selection(item, assigned_component_type).map_err(|p| vec![p])?;

    let problems = field_problems(&SelectionFields {
        component_type: selection
            .component_type
            .as_deref()
            .unwrap_or(UNTYPED_COMPONENT),
        component_id: &selection.component_id,
        system_code: selection.system_code.as_deref(),
        price: selection.price,
        currency: selection.currency.as_deref(),
        quantity: selection.quantity,
    });
    if problems.is_empty() {
        Ok(selection)
    } else {
        Err(problems)
    }
}

fn read_selection(
    item: &Value,
    assigned_component_type: Option<&str>,
) -> Result<WizardSelection, (&'static str, String)> {
    let inherited = assigned_component_type.map(str::to_string);

    // A bare id picks the component with default quantity.
    if let Some(component_id) = id_string(item) {
        return Ok(WizardSelection {
            component_id,
            component_name: None,
            component_type: inherited,
            system_code: None,
            quantity: default_quantity(),
            price: None,
            currency: None,
            notes: None,
        });
    }

    let Some(obj) = item.as_object() else {
        return Err(("component_id", "can't be blank".to_string()));
    };

    let component_id = obj
        .get("component_id")
        .and_then(id_string)
        .ok_or(("component_id", "can't be blank".to_string()))?;

    let quantity = match obj.get("quantity") {
        None | Some(Value::Null) => default_quantity(),
        Some(v) => as_i64(v)
            .and_then(|q| i32::try_from(q).ok())
            .ok_or(("quantity", "is not a number".to_string()))?,
    };

    let price = match obj.get("price") {
        None | Some(Value::Null) => None,
        Some(v) => Some(as_f64(v).ok_or(("price", "is not a number".to_string()))?),
    };

    Ok(WizardSelection {
        component_id,
        component_name: non_blank_str(obj.get("component_name")),
        component_type: non_blank_str(obj.get("component_type")).or(inherited),
        system_code: non_blank_str(obj.get("system_code")),
        quantity,
        price: price.map(|p| if p.is_finite() { round_cents(p) } else { p }),
        currency: non_blank_str(obj.get("currency")),
        notes: non_blank_str(obj.get("notes")),
    })
}

/// Integers arrive as JSON numbers or, from form posts, numeric strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_review(obj: &serde_json::Map<String, Value>) -> Result<StepAnswer, FieldErrors> {
    let Some(configuration_name) = non_blank_str(obj.get("configuration_name")) else {
        return Err(single_error("configuration_name", "can't be blank"));
    };
    if let Err(CoreError::Validation(message)) = validate_name(&configuration_name) {
        return Err(single_error("configuration_name", &message));
    }
    Ok(StepAnswer::Review(ReviewAnswer {
        configuration_name,
        description: non_blank_str(obj.get("description")),
    }))
}

// ---------------------------------------------------------------------------
// Step data
// ---------------------------------------------------------------------------

/// Accepted answers for a session, one optional bucket per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    #[serde(rename = "step_1", default, skip_serializing_if = "Option::is_none")]
    pub system_type: Option<SystemTypeAnswer>,
    #[serde(rename = "step_2", default, skip_serializing_if = "Option::is_none")]
    pub system_specifications: Option<SystemSpecificationsAnswer>,
    #[serde(rename = "step_3", default, skip_serializing_if = "Option::is_none")]
    pub component_types: Option<ComponentTypesAnswer>,
    #[serde(rename = "step_4", default, skip_serializing_if = "Option::is_none")]
    pub component_selection_1: Option<ComponentSelectionAnswer>,
    #[serde(rename = "step_5", default, skip_serializing_if = "Option::is_none")]
    pub component_selection_2: Option<ComponentSelectionAnswer>,
    #[serde(rename = "step_6", default, skip_serializing_if = "Option::is_none")]
    pub component_selection_3: Option<ComponentSelectionAnswer>,
    #[serde(rename = "step_7", default, skip_serializing_if = "Option::is_none")]
    pub component_selection_4: Option<ComponentSelectionAnswer>,
    #[serde(rename = "step_8", default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewAnswer>,
}

impl StepData {
    fn selection_bucket(&self, step: WizardStep) -> Option<&ComponentSelectionAnswer> {
        match step {
            WizardStep::ComponentSelection1 => self.component_selection_1.as_ref(),
            WizardStep::ComponentSelection2 => self.component_selection_2.as_ref(),
            WizardStep::ComponentSelection3 => self.component_selection_3.as_ref(),
            WizardStep::ComponentSelection4 => self.component_selection_4.as_ref(),
            _ => None,
        }
    }

    fn selection_bucket_mut(
        &mut self,
        step: WizardStep,
    ) -> Option<&mut Option<ComponentSelectionAnswer>> {
        match step {
            WizardStep::ComponentSelection1 => Some(&mut self.component_selection_1),
            WizardStep::ComponentSelection2 => Some(&mut self.component_selection_2),
            WizardStep::ComponentSelection3 => Some(&mut self.component_selection_3),
            WizardStep::ComponentSelection4 => Some(&mut self.component_selection_4),
            _ => None,
        }
    }

    /// The stored answer for a step, if any.
    pub fn answer(&self, step: WizardStep) -> Option<StepAnswer> {
        match step {
            WizardStep::SystemType => self.system_type.clone().map(StepAnswer::SystemType),
            WizardStep::SystemSpecifications => self
                .system_specifications
                .clone()
                .map(StepAnswer::SystemSpecifications),
            WizardStep::ComponentTypes => {
                self.component_types.clone().map(StepAnswer::ComponentTypes)
            }
            WizardStep::Review => self.review.clone().map(StepAnswer::Review),
            selection => self
                .selection_bucket(selection)
                .cloned()
                .map(StepAnswer::ComponentSelection),
        }
    }

    /// The stored answer as JSON, or an empty object.
    pub fn answer_json(&self, step: WizardStep) -> Value {
        self.answer(step)
            .map(|a| a.to_json())
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    pub fn has_answer(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::SystemType => self.system_type.is_some(),
            WizardStep::SystemSpecifications => self.system_specifications.is_some(),
            WizardStep::ComponentTypes => self.component_types.is_some(),
            WizardStep::Review => self.review.is_some(),
            selection => self.selection_bucket(selection).is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        WizardStep::ALL.iter().all(|s| !self.has_answer(*s))
    }

    /// Replace the bucket for `step`. Returns the previous answer.
    pub fn store(
        &mut self,
        step: WizardStep,
        answer: StepAnswer,
    ) -> Result<Option<StepAnswer>, CoreError> {
        let previous = self.answer(step);
        match (step, answer) {
            (WizardStep::SystemType, StepAnswer::SystemType(a)) => self.system_type = Some(a),
            (WizardStep::SystemSpecifications, StepAnswer::SystemSpecifications(a)) => {
                self.system_specifications = Some(a)
            }
            (WizardStep::ComponentTypes, StepAnswer::ComponentTypes(a)) => {
                self.component_types = Some(a)
            }
            (WizardStep::Review, StepAnswer::Review(a)) => self.review = Some(a),
            (step, StepAnswer::ComponentSelection(a)) if step.component_slot().is_some() => {
                if let Some(bucket) = self.selection_bucket_mut(step) {
                    *bucket = Some(a);
                }
            }
            (step, _) => {
                return Err(CoreError::Validation(format!(
                    "Answer does not belong to step {}",
                    step.number()
                )))
            }
        }
        Ok(previous)
    }

    /// Remove the bucket for `step`. Returns whether anything was removed.
    pub fn clear(&mut self, step: WizardStep) -> bool {
        let had = self.has_answer(step);
        match step {
            WizardStep::SystemType => self.system_type = None,
            WizardStep::SystemSpecifications => self.system_specifications = None,
            WizardStep::ComponentTypes => self.component_types = None,
            WizardStep::Review => self.review = None,
            selection => {
                if let Some(bucket) = self.selection_bucket_mut(selection) {
                    *bucket = None;
                }
            }
        }
        had
    }

    /// Remove every bucket after `step`. Returns the steps that were cleared.
    pub fn clear_after(&mut self, step: WizardStep) -> Vec<WizardStep> {
        WizardStep::ALL
            .iter()
            .copied()
            .filter(|s| s.number() > step.number())
            .filter(|s| self.clear(*s))
            .collect()
    }

    /// Store an accepted answer and apply the backward-edit policy.
    ///
    /// Returns the later steps whose answers were discarded.
    pub fn accept(
        &mut self,
        step: WizardStep,
        answer: StepAnswer,
        policy: BackwardEditPolicy,
    ) -> Result<Vec<WizardStep>, CoreError> {
        let incoming = answer.clone();
        let previous = self.store(step, answer)?;
        let changed = previous.is_some_and(|p| p != incoming);
        if changed && policy == BackwardEditPolicy::Invalidate {
            Ok(self.clear_after(step))
        } else {
            Ok(Vec::new())
        }
    }

    pub fn system_type(&self) -> Option<&str> {
        self.system_type.as_ref().map(|a| a.system_type.as_str())
    }

    pub fn system_specifications(&self) -> Option<&Value> {
        self.system_specifications
            .as_ref()
            .map(|a| &a.system_specifications)
    }

    pub fn component_types(&self) -> &[String] {
        self.component_types
            .as_ref()
            .map(|a| a.component_types.as_slice())
            .unwrap_or(&[])
    }

    /// The component type a selection step picks for, if one was chosen.
    pub fn component_type_for(&self, step: WizardStep) -> Option<&str> {
        step.component_slot()
            .and_then(|slot| self.component_types().get(slot))
            .map(String::as_str)
    }

    /// Selections from steps 4 to 7, in step order.
    pub fn selections(&self) -> impl Iterator<Item = &WizardSelection> {
        [
            &self.component_selection_1,
            &self.component_selection_2,
            &self.component_selection_3,
            &self.component_selection_4,
        ]
        .into_iter()
        .flatten()
        .flat_map(|a| a.selected_components.iter())
    }

    pub fn configuration_name(&self) -> Option<&str> {
        self.review.as_ref().map(|a| a.configuration_name.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.review.as_ref().and_then(|a| a.description.as_deref())
    }

    /// Running total of the accumulated selections.
    pub fn total_price(&self) -> f64 {
        configuration_total(self.selections())
    }

    /// Whether the review step has been answered and the total can be
    /// stored.
    pub fn can_complete(&self) -> bool {
        self.review.is_some() && fits_amount(self.total_price())
    }

    /// `system_specifications` for the configuration created on completion.
    ///
    /// An object answer is extended with the system type and component
    /// types; any other answer is nested under `specifications`.
    pub fn configuration_specifications(&self) -> Value {
        let mut spec = match self.system_specifications() {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("specifications".to_string(), other.clone());
                map
            }
            None => serde_json::Map::new(),
        };
        if let Some(system_type) = self.system_type() {
            spec.insert(
                SYSTEM_TYPE_KEY.to_string(),
                Value::String(system_type.to_string()),
            );
        }
        let component_types = self.component_types();
        if !component_types.is_empty() {
            spec.insert(
                "component_types".to_string(),
                Value::from(component_types.to_vec()),
            );
        }
        Value::Object(spec)
    }
}

/// Check that a session may be completed and return its review answer.
pub fn require_completable(
    status: WizardStatus,
    data: &StepData,
) -> Result<&ReviewAnswer, CoreError> {
    if status != WizardStatus::Active {
        return Err(CoreError::Validation(format!(
            "Wizard session is {}, not active",
            status.as_str()
        )));
    }
    let review = data.review.as_ref().ok_or_else(|| {
        CoreError::Validation(
            "Complete the review step before finishing the configuration".to_string(),
        )
    })?;
    if !fits_amount(data.total_price()) {
        return Err(CoreError::Validation(format!(
            "Configuration total exceeds the maximum of {MAX_AMOUNT:.2}"
        )));
    }
    Ok(review)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Snapshot of the wizard's accumulated answers, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardSummary {
    pub system_type: Option<String>,
    pub system_type_description: Option<&'static str>,
    pub system_specifications: Option<Value>,
    pub component_types: Vec<String>,
    pub component_selections: Vec<WizardSelection>,
    pub component_count: usize,
    pub total_quantity: i64,
    pub configuration_name: Option<String>,
    pub description: Option<String>,
    pub total_price: f64,
    pub can_complete: bool,
}

impl WizardSummary {
    pub fn build(data: &StepData) -> Self {
        let component_selections: Vec<WizardSelection> = data.selections().cloned().collect();
        let total_quantity = component_selections
            .iter()
            .map(|s| i64::from(s.quantity))
            .sum();

        Self {
            system_type: data.system_type().map(str::to_string),
            system_type_description: data.system_type().map(system_type_description),
            system_specifications: data.system_specifications().cloned(),
            component_types: data.component_types().to_vec(),
            component_count: component_selections.len(),
            total_quantity,
            total_price: configuration_total(&component_selections),
            component_selections,
            configuration_name: data.configuration_name().map(str::to_string),
            description: data.description().map(str::to_string),
            can_complete: data.can_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn parse(step: i32, payload: Value) -> Result<StepAnswer, FieldErrors> {
        let step = WizardStep::from_number(step).unwrap();
        StepAnswer::parse(step, &payload, None)
    }

    fn accept(data: &mut StepData, step: i32, payload: Value) {
        let step = WizardStep::from_number(step).unwrap();
        let assigned = data.component_type_for(step).map(str::to_string);
        let answer = StepAnswer::parse(step, &payload, assigned.as_deref()).unwrap();
        data.accept(step, answer, BackwardEditPolicy::Retain).unwrap();
    }

    // -- steps --------------------------------------------------------------

    #[test]
    fn step_numbers_roundtrip() {
        for n in MIN_STEP..=MAX_STEP {
            assert_eq!(WizardStep::from_number(n).unwrap().number(), n);
        }
    }

    #[test]
    fn out_of_range_steps_are_invalid() {
        assert_matches!(WizardStep::from_number(0), Err(CoreError::InvalidStep(_)));
        assert_matches!(WizardStep::from_number(9), Err(CoreError::InvalidStep(_)));
        assert_matches!(WizardStep::parse("abc"), Err(CoreError::InvalidStep(_)));
        assert_matches!(WizardStep::parse("8"), Ok(WizardStep::Review));
    }

    #[test]
    fn step_metadata() {
        let step = WizardStep::from_number(4).unwrap();
        assert_eq!(step.name(), "component_selection_1");
        assert_eq!(step.title(), "Component Selection 1");
        assert_eq!(step.data_key(), "step_4");
        assert_eq!(step.component_slot(), Some(0));
        assert_eq!(WizardStep::Review.title(), "Review and Complete");
    }

    #[test]
    fn next_and_previous() {
        assert_eq!(WizardStep::SystemType.previous(), None);
        assert_eq!(
            WizardStep::SystemType.next(),
            Some(WizardStep::SystemSpecifications)
        );
        assert_eq!(WizardStep::Review.next(), None);
    }

    #[test]
    fn progress_is_rounded_percentage() {
        assert_eq!(progress_percentage(1), 13);
        assert_eq!(progress_percentage(4), 50);
        assert_eq!(WizardStep::Review.progress_percentage(), 100);
    }

    #[test]
    fn system_type_descriptions() {
        assert_eq!(
            system_type_description("belt_conveyor"),
            "Standard belt conveyor system for general material handling"
        );
        assert_eq!(
            system_type_description("teleporter"),
            "Custom conveyor system configuration"
        );
    }

    // -- parsing ------------------------------------------------------------

    #[test]
    fn system_type_must_be_present() {
        assert_matches!(parse(1, json!({ "system_type": "belt_conveyor" })), Ok(_));
        let errors = parse(1, json!({ "system_type": "  " })).unwrap_err();
        assert_eq!(errors["system_type"], "can't be blank");
    }

    #[test]
    fn system_specifications_must_be_present() {
        assert_matches!(parse(2, json!({ "system_specifications": { "length": 10 } })), Ok(_));
        assert_matches!(parse(2, json!({ "system_specifications": "System A" })), Ok(_));
        assert!(parse(2, json!({ "system_specifications": {} })).is_err());
        assert!(parse(2, json!({ "system_specifications": null })).is_err());
        assert!(parse(2, json!({})).is_err());
    }

    #[test]
    fn empty_component_types_are_rejected() {
        let errors = parse(3, json!({ "component_types": [] })).unwrap_err();
        assert!(errors.contains_key("component_types"));
        assert!(parse(3, json!({ "component_types": "motor" })).is_err());
        assert!(parse(3, json!({ "component_types": ["motor", ""] })).is_err());
    }

    #[test]
    fn component_types_keep_order() {
        let answer = parse(3, json!({ "component_types": ["motor", "belt"] })).unwrap();
        assert_matches!(answer, StepAnswer::ComponentTypes(a) if a.component_types == ["motor", "belt"]);
    }

    #[test]
    fn selections_accept_bare_ids_and_objects() {
        let answer = StepAnswer::parse(
            WizardStep::ComponentSelection1,
            &json!({ "selected_components": [
                "17",
                42,
                { "component_id": "9", "quantity": "3", "price": 12.5, "component_name": "Drive" }
            ]}),
            Some("motor"),
        )
        .unwrap();

        let StepAnswer::ComponentSelection(a) = answer else {
            panic!("expected selection answer");
        };
        assert_eq!(a.selected_components.len(), 3);
        assert_eq!(a.selected_components[0].component_id, "17");
        assert_eq!(a.selected_components[0].quantity, 1);
        assert_eq!(a.selected_components[1].component_id, "42");
        assert_eq!(a.selected_components[2].quantity, 3);
        assert_eq!(a.selected_components[2].price, Some(12.5));
        assert!(a
            .selected_components
            .iter()
            .all(|s| s.component_type.as_deref() == Some("motor")));
    }

    #[test]
    fn explicit_component_type_wins_over_assigned() {
        let answer = StepAnswer::parse(
            WizardStep::ComponentSelection2,
            &json!({ "selected_components": [{ "component_id": "1", "component_type": "sensor" }] }),
            Some("motor"),
        )
        .unwrap();
        assert_matches!(
            answer,
            StepAnswer::ComponentSelection(a)
                if a.selected_components[0].component_type.as_deref() == Some("sensor")
        );
    }

    #[test]
    fn selection_rules_are_enforced() {
        assert!(parse(4, json!({ "selected_components": [] })).is_err());

        let errors = parse(
            4,
            json!({ "selected_components": [
                { "component_id": "1", "quantity": 0 },
                { "component_id": "2", "price": -5 },
                { "name": "missing id" }
            ]}),
        )
        .unwrap_err();
        assert_eq!(errors["selected_components[0].quantity"], "must be greater than 0");
        assert_eq!(
            errors["selected_components[1].price"],
            "must be greater than or equal to 0"
        );
        assert_eq!(errors["selected_components[2].component_id"], "can't be blank");
    }

    #[test]
    fn selections_obey_storage_limits() {
        let long_type = "t".repeat(150);
        let errors = StepAnswer::parse(
            WizardStep::ComponentSelection1,
            &json!({ "selected_components": [
                { "component_id": "1", "system_code": "ABCDEFGHIJKL", "currency": "EURO", "price": 1e11 }
            ]}),
            Some(long_type.as_str()),
        )
        .unwrap_err();

        assert!(errors["selected_components[0].component_type"].starts_with("is too long"));
        assert!(errors["selected_components[0].system_code"].starts_with("is too long"));
        assert!(errors["selected_components[0].currency"].starts_with("is too long"));
        assert_eq!(
            errors["selected_components[0].price"],
            "must be less than or equal to 9999999999.99"
        );
    }

    #[test]
    fn line_total_must_fit_a_money_column() {
        let errors = parse(
            4,
            json!({ "selected_components": [{ "component_id": "1", "price": 5e9, "quantity": 3 }] }),
        )
        .unwrap_err();
        assert!(errors["selected_components[0].price"].starts_with("multiplied by quantity"));
    }

    #[test]
    fn long_component_types_are_rejected() {
        let errors = parse(3, json!({ "component_types": ["motor", "x".repeat(101)] })).unwrap_err();
        assert_eq!(
            errors["component_types"],
            "must contain names of at most 100 characters"
        );
        assert_matches!(parse(3, json!({ "component_types": ["x".repeat(100)] })), Ok(_));
    }

    #[test]
    fn prices_are_kept_to_cents() {
        let answer = parse(
            4,
            json!({ "selected_components": [{ "component_id": "1", "price": 19.999, "quantity": 2 }] }),
        )
        .unwrap();
        let StepAnswer::ComponentSelection(a) = answer else {
            panic!("expected selection answer");
        };
        assert_eq!(a.selected_components[0].price, Some(20.0));
        assert_eq!(configuration_total(&a.selected_components), 40.0);
    }

    #[test]
    fn review_requires_a_valid_name() {
        assert_matches!(parse(8, json!({ "configuration_name": "Line 1" })), Ok(_));
        assert!(parse(8, json!({ "configuration_name": "" })).is_err());
        let errors = parse(8, json!({ "configuration_name": "ab" })).unwrap_err();
        assert!(errors["configuration_name"].contains("between 3 and 200"));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = parse(1, json!("belt_conveyor")).unwrap_err();
        assert_eq!(errors["base"], "must be an object");
    }

    // -- step data ----------------------------------------------------------

    #[test]
    fn step_data_serializes_by_step_key() {
        let mut data = StepData::default();
        accept(&mut data, 1, json!({ "system_type": "belt_conveyor" }));
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, json!({ "step_1": { "system_type": "belt_conveyor" } }));

        let back: StepData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn stored_answer_is_returned_verbatim() {
        let mut data = StepData::default();
        accept(&mut data, 3, json!({ "component_types": ["motor", "belt"] }));
        assert_eq!(
            data.answer_json(WizardStep::ComponentTypes),
            json!({ "component_types": ["motor", "belt"] })
        );
        assert_eq!(data.answer_json(WizardStep::Review), json!({}));
    }

    #[test]
    fn selection_steps_follow_chosen_types() {
        let mut data = StepData::default();
        accept(&mut data, 3, json!({ "component_types": ["motor", "belt"] }));
        assert_eq!(data.component_type_for(WizardStep::ComponentSelection1), Some("motor"));
        assert_eq!(data.component_type_for(WizardStep::ComponentSelection2), Some("belt"));
        assert_eq!(data.component_type_for(WizardStep::ComponentSelection3), None);
        assert_eq!(data.component_type_for(WizardStep::Review), None);
    }

    #[test]
    fn running_total_sums_selection_steps() {
        let mut data = StepData::default();
        accept(
            &mut data,
            4,
            json!({ "selected_components": [{ "component_id": "a", "price": 100, "quantity": 2 }] }),
        );
        accept(
            &mut data,
            5,
            json!({ "selected_components": [{ "component_id": "b", "price": 50, "quantity": 1 }] }),
        );
        assert_eq!(data.total_price(), 250.0);
        assert_eq!(data.selections().count(), 2);
    }

    #[test]
    fn store_rejects_mismatched_answer() {
        let mut data = StepData::default();
        let answer = parse(1, json!({ "system_type": "belt_conveyor" })).unwrap();
        assert_matches!(
            data.store(WizardStep::Review, answer),
            Err(CoreError::Validation(_))
        );
        assert!(data.is_empty());
    }

    #[test]
    fn clear_removes_single_bucket() {
        let mut data = StepData::default();
        accept(&mut data, 1, json!({ "system_type": "belt_conveyor" }));
        accept(&mut data, 8, json!({ "configuration_name": "Line 1" }));
        assert!(data.clear(WizardStep::Review));
        assert!(!data.clear(WizardStep::Review));
        assert!(data.has_answer(WizardStep::SystemType));
    }

    // -- backward-edit policy -----------------------------------------------

    fn filled() -> StepData {
        let mut data = StepData::default();
        accept(&mut data, 1, json!({ "system_type": "belt_conveyor" }));
        accept(&mut data, 2, json!({ "system_specifications": { "length": 10 } }));
        accept(&mut data, 3, json!({ "component_types": ["motor"] }));
        data
    }

    #[test]
    fn retain_policy_keeps_later_answers() {
        let mut data = filled();
        let answer = parse(1, json!({ "system_type": "roller_conveyor" })).unwrap();
        let purged = data
            .accept(WizardStep::SystemType, answer, BackwardEditPolicy::Retain)
            .unwrap();
        assert!(purged.is_empty());
        assert!(data.has_answer(WizardStep::ComponentTypes));
    }

    #[test]
    fn invalidate_policy_purges_after_changed_answer() {
        let mut data = filled();
        let answer = parse(1, json!({ "system_type": "roller_conveyor" })).unwrap();
        let purged = data
            .accept(WizardStep::SystemType, answer, BackwardEditPolicy::Invalidate)
            .unwrap();
        assert_eq!(
            purged,
            vec![WizardStep::SystemSpecifications, WizardStep::ComponentTypes]
        );
        assert_eq!(data.system_type(), Some("roller_conveyor"));
    }

    #[test]
    fn invalidate_policy_ignores_identical_answer() {
        let mut data = filled();
        let answer = parse(1, json!({ "system_type": "belt_conveyor" })).unwrap();
        let purged = data
            .accept(WizardStep::SystemType, answer, BackwardEditPolicy::Invalidate)
            .unwrap();
        assert!(purged.is_empty());
        assert!(data.has_answer(WizardStep::ComponentTypes));
    }

    #[test]
    fn policy_parses_from_config() {
        assert_eq!(
            BackwardEditPolicy::from_str_config("Invalidate").unwrap(),
            BackwardEditPolicy::Invalidate
        );
        assert!(BackwardEditPolicy::from_str_config("drop").is_err());
        assert_eq!(BackwardEditPolicy::default(), BackwardEditPolicy::Retain);
    }

    // -- completion and summary ---------------------------------------------

    #[test]
    fn completion_requires_review_and_active_session() {
        let mut data = filled();
        assert_matches!(
            require_completable(WizardStatus::Active, &data),
            Err(CoreError::Validation(_))
        );
        accept(&mut data, 8, json!({ "configuration_name": "Line 1" }));
        assert_matches!(require_completable(WizardStatus::Active, &data), Ok(a) if a.configuration_name == "Line 1");
        assert_matches!(
            require_completable(WizardStatus::Completed, &data),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn completion_requires_a_storable_total() {
        let mut data = filled();
        for step in 4..=6 {
            let payload = if step == 4 {
                json!({ "selected_components": [{ "component_id": "a", "price": 4e9, "quantity": 2 }] })
            } else {
                json!({ "selected_components": [{ "component_id": "b", "price": 4e9 }] })
            };
            let step = WizardStep::from_number(step).unwrap();
            let answer = StepAnswer::parse(step, &payload, Some("motor")).unwrap();
            data.accept(step, answer, BackwardEditPolicy::Retain).unwrap();
        }
        accept(&mut data, 8, json!({ "configuration_name": "Line 1" }));

        assert!(!data.can_complete());
        assert!(!WizardSummary::build(&data).can_complete);
        assert_matches!(
            require_completable(WizardStatus::Active, &data),
            Err(CoreError::Validation(msg)) if msg.contains("exceeds the maximum")
        );
    }

    #[test]
    fn configuration_specifications_merge_steps() {
        let data = filled();
        assert_eq!(
            data.configuration_specifications(),
            json!({ "length": 10, "system_type": "belt_conveyor", "component_types": ["motor"] })
        );

        let mut scalar = StepData::default();
        accept(&mut scalar, 2, json!({ "system_specifications": "System A" }));
        assert_eq!(
            scalar.configuration_specifications(),
            json!({ "specifications": "System A" })
        );
    }

    #[test]
    fn summary_reflects_step_data() {
        let mut data = filled();
        accept(
            &mut data,
            4,
            json!({ "selected_components": [{ "component_id": "a", "price": 12.5, "quantity": 2 }, "b"] }),
        );
        let summary = WizardSummary::build(&data);
        assert_eq!(summary.system_type.as_deref(), Some("belt_conveyor"));
        assert_eq!(summary.component_count, 2);
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.total_price, 25.0);
        assert!(!summary.can_complete);
        assert_eq!(
            summary.component_selections[1].component_type.as_deref(),
            Some("motor")
        );
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            WizardStatus::Active,
            WizardStatus::Completed,
            WizardStatus::Abandoned,
        ] {
            assert_eq!(WizardStatus::from_str_db(status.as_str()).unwrap(), status);
        }
    }
}
