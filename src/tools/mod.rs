//! Tool trait and registry
//!
//! Tools are the backend capabilities the model may call. Each declares an
//! explicit parameter schema; the registry checks schemas at registration,
//! advertises only validly-named tools, and rejects calls with unknown names
//! or missing / null required arguments before any handler runs.

use crate::error::AssistantError;
use crate::lookup::LookupStore;
use crate::mail::Mailer;
use crate::model::{FunctionCall, FunctionDeclaration};
use crate::models::SessionId;
use crate::otp::OtpSimulator;
use crate::validation::{is_valid_tool_name, parse_rupee_amount};
use crate::Result;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod cards;
pub mod identity;
pub mod verification;

pub use cards::{GetCreditCardsTool, GetValidCardsTool};
pub use identity::{GetAddressTool, GetCibilTool, GetSalaryTool, VerifyIdentityTool};
pub use verification::{
    SendConfirmationTool, SendEmailOtpTool, VerifyAadhaarOtpTool, VerifyAadhaarSendOtpTool,
    VerifyEmailOtpTool,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

}

/// Per-call context handed to tools.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext {
    pub session_id: SessionId,
}

/// Validated call arguments with lenient coercion for model-produced values.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new(args: Map<String, Value>) -> Self {
        Self(args)
    }

    /// Text value; numbers and booleans are rendered as text.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric value; amount strings such as "Rs. 5,00,000" are accepted.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_rupee_amount(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.number(name)
            .filter(|n| n.is_finite() && n.fract() == 0.0)
            .map(|n| n as i64)
    }

    fn inner(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> &'static [ParamSpec];

    /// Format problems are returned as corrective text (`Ok`); `Err` means the
    /// handler itself failed.
    async fn execute(&self, ctx: &ToolContext, args: &ToolArgs) -> Result<String>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Checks the schema (unique, non-empty parameter names; unique tool name).
    /// Names outside the identifier pattern are accepted here but never
    /// advertised or called.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();

        if self.tools.contains_key(name) {
            return Err(AssistantError::RegistrationError(format!(
                "Tool '{}' registered twice",
                name
            )));
        }

        let mut seen = HashSet::new();
        for param in tool.parameters() {
            if param.name.trim().is_empty() {
                return Err(AssistantError::RegistrationError(format!(
                    "Tool '{}' declares an unnamed parameter",
                    name
                )));
            }
            if !seen.insert(param.name) {
                return Err(AssistantError::RegistrationError(format!(
                    "Tool '{}' declares parameter '{}' twice",
                    name, param.name
                )));
            }
        }

        if !is_valid_tool_name(name) {
            warn!(tool = name, "Tool name is not a valid identifier; it will not be advertised");
        }

        self.tools.insert(name.to_string(), tool);
        Ok(())
    }

    /// Only tools with valid names are resolvable.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        if !is_valid_tool_name(name) {
            return None;
        }
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Schemas advertised to the model.
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .values()
            .filter_map(|tool| {
                if !is_valid_tool_name(tool.name()) {
                    warn!(tool = tool.name(), "Skipping invalid function name");
                    return None;
                }
                Some(declaration_for(tool.as_ref()))
            })
            .collect()
    }

    /// Resolve the tool and check required arguments. Nothing executes here.
    pub fn validate_call(&self, call: &FunctionCall) -> Result<(Arc<dyn Tool>, ToolArgs)> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AssistantError::ToolNotFound(call.name.clone()))?;

        let missing: Vec<&str> = tool
            .parameters()
            .iter()
            .filter(|p| p.required)
            .filter(|p| matches!(call.args.get(p.name), None | Some(Value::Null)))
            .map(|p| p.name)
            .collect();

        if !missing.is_empty() {
            return Err(AssistantError::InvalidToolInput(format!(
                "{} missing required argument(s): {}",
                call.name,
                missing.join(", ")
            )));
        }

        let unexpected: Vec<&String> = call
            .args
            .keys()
            .filter(|k| !tool.parameters().iter().any(|p| p.name == k.as_str()))
            .collect();
        if !unexpected.is_empty() {
            debug!(tool = %call.name, ?unexpected, "Ignoring undeclared arguments");
        }

        Ok((tool, ToolArgs::new(call.args.clone())))
    }

    /// Validate, then run the handler once.
    pub async fn execute(&self, call: &FunctionCall, ctx: &ToolContext) -> Result<String> {
        let (tool, args) = self.validate_call(call)?;
        debug!(tool = tool.name(), args = ?args.inner(), "Executing tool");
        tool.execute(ctx, &args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn declaration_for(tool: &dyn Tool) -> FunctionDeclaration {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in tool.parameters() {
        properties.insert(
            param.name.to_string(),
            json!({
                "type": param.kind.json_type(),
                "description": param.description,
            }),
        );
        if param.required {
            required.push(Value::String(param.name.to_string()));
        }
    }

    FunctionDeclaration {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

/// Create the registry with every assistant tool.
pub fn create_default_registry(
    lookup: Arc<dyn LookupStore>,
    otp: Arc<OtpSimulator>,
    mailer: Arc<dyn Mailer>,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    // Card search
    registry.register(Arc::new(GetCreditCardsTool::new(lookup.clone())))?;
    registry.register(Arc::new(GetValidCardsTool::new(lookup.clone())))?;

    // Verification flow
    registry.register(Arc::new(SendEmailOtpTool::new(otp.clone())))?;
    registry.register(Arc::new(VerifyEmailOtpTool::new(otp.clone())))?;
    registry.register(Arc::new(VerifyAadhaarSendOtpTool::new(otp.clone())))?;
    registry.register(Arc::new(VerifyAadhaarOtpTool::new(otp)))?;

    // Identity & financial lookups
    registry.register(Arc::new(VerifyIdentityTool::new(lookup.clone())))?;
    registry.register(Arc::new(GetCibilTool::new(lookup.clone())))?;
    registry.register(Arc::new(GetAddressTool::new(lookup.clone())))?;
    registry.register(Arc::new(GetSalaryTool::new(lookup)))?;

    registry.register(Arc::new(SendConfirmationTool::new(mailer)))?;

    Ok(registry)
}
