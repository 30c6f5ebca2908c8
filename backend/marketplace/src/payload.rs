//! Entry-function payloads for the EcoChain Move modules, and the wire
//! shapes wallets accept them in.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Credits bought per marketplace click.
pub const DEFAULT_CREDITS: u64 = 1;

/// Entry functions this service knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketFunction {
    PurchaseCredits,
    RetireCredits,
    Initialize,
    CreateProject,
}

impl MarketFunction {
    pub fn module(&self) -> &'static str {
        match self {
            Self::PurchaseCredits | Self::RetireCredits | Self::Initialize => "marketplace",
            Self::CreateProject => "verification",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PurchaseCredits => "purchase_credits",
            Self::RetireCredits => "retire_credits",
            Self::Initialize => "initialize",
            Self::CreateProject => "create_project",
        }
    }

    /// Fully qualified `<address>::<module>::<function>` id.
    pub fn function_id(&self, address: &str) -> String {
        format!("{address}::{}::{}", self.module(), self.name())
    }
}

impl fmt::Display for MarketFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module(), self.name())
    }
}

/// How a payload is laid out on the wire for a given wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// Flat fields tagged `"type": "entry_function_payload"`.
    Entry,
    /// Flat fields without a type tag (Petra's extension API).
    Bare,
    /// `{ sender, data: { function, typeArguments, functionArguments } }`.
    Wrapped,
}

/// A call to an entry function with positional string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFunctionPayload {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<String>,
}

impl EntryFunctionPayload {
    pub fn new(address: &str, function: MarketFunction, arguments: Vec<String>) -> Self {
        Self {
            function: function.function_id(address),
            type_arguments: Vec::new(),
            arguments,
        }
    }

    /// `purchase_credits` / `retire_credits` call: `[project_id, credits, price]`.
    pub fn credit_trade(
        address: &str,
        function: MarketFunction,
        project_id: &str,
        credits: u64,
        price: &str,
    ) -> Self {
        Self::new(
            address,
            function,
            vec![project_id.to_string(), credits.to_string(), price.to_string()],
        )
    }

    /// Render the payload in `shape`. `sender` is only used by [`PayloadShape::Wrapped`].
    pub fn to_shape(&self, shape: PayloadShape, sender: Option<&str>) -> Value {
        match shape {
            PayloadShape::Entry => json!({
                "type": "entry_function_payload",
                "function": self.function,
                "type_arguments": self.type_arguments,
                "arguments": self.arguments,
            }),
            PayloadShape::Bare => json!({
                "function": self.function,
                "type_arguments": self.type_arguments,
                "arguments": self.arguments,
            }),
            PayloadShape::Wrapped => {
                let mut wrapped = json!({
                    "data": {
                        "function": self.function,
                        "typeArguments": self.type_arguments,
                        "functionArguments": self.arguments,
                    }
                });
                if let Some(sender) = sender {
                    wrapped["sender"] = json!(sender);
                }
                wrapped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xda14";

    #[test]
    fn function_ids() {
        assert_eq!(
            MarketFunction::PurchaseCredits.function_id(ADDR),
            "0xda14::marketplace::purchase_credits"
        );
        assert_eq!(
            MarketFunction::CreateProject.function_id(ADDR),
            "0xda14::verification::create_project"
        );
        assert_eq!(
            MarketFunction::RetireCredits.to_string(),
            "marketplace::retire_credits"
        );
    }

    #[test]
    fn flat_shapes() {
        let payload = EntryFunctionPayload::credit_trade(
            ADDR,
            MarketFunction::PurchaseCredits,
            "RF-2023-089",
            1,
            "1845",
        );

        let entry = payload.to_shape(PayloadShape::Entry, None);
        assert_eq!(entry["type"], "entry_function_payload");
        assert_eq!(entry["arguments"], json!(["RF-2023-089", "1", "1845"]));
        assert_eq!(entry["type_arguments"], json!([]));

        let bare = payload.to_shape(PayloadShape::Bare, Some("0xabc"));
        assert!(bare.get("type").is_none());
        assert!(bare.get("sender").is_none());
        assert_eq!(bare["function"], "0xda14::marketplace::purchase_credits");
    }

    #[test]
    fn wrapped_shape() {
        let payload = EntryFunctionPayload::credit_trade(
            ADDR,
            MarketFunction::RetireCredits,
            "WE-2023-092",
            3,
            "1370",
        );

        let wrapped = payload.to_shape(PayloadShape::Wrapped, Some("0xabc"));
        assert_eq!(wrapped["sender"], "0xabc");
        assert_eq!(wrapped["data"]["function"], "0xda14::marketplace::retire_credits");
        assert_eq!(
            wrapped["data"]["functionArguments"],
            json!(["WE-2023-092", "3", "1370"])
        );

        let anonymous = payload.to_shape(PayloadShape::Wrapped, None);
        assert!(anonymous.get("sender").is_none());
    }
}
