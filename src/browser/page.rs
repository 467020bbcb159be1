use crate::{dom::{BoundingBox, Dom, ElementNode, MutationRecord, NodeId, ObserveOptions, ScrollOptions, UserEvent},
            error::{HighlightError, Result}};
use headless_chrome::Tab;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use std::sync::Arc;

const BRIDGE_JS: &str = include_str!("bridge.js");

/// Answer of one bridge call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply<T> {
    Ok(T),
    Error(BridgeFailure),
}

#[derive(Debug, Deserialize)]
struct BridgeFailure {
    code: String,
    message: String,
    #[serde(default)]
    node: Option<NodeId>,
}

impl From<BridgeFailure> for HighlightError {
    fn from(failure: BridgeFailure) -> Self {
        match (failure.code.as_str(), failure.node) {
            ("notFound", Some(node)) => HighlightError::NodeNotFound(node),
            ("invalid", _) => HighlightError::InvalidOperation(failure.message),
            ("missing", _) => HighlightError::BridgeProtocol(format!(
                "page bridge is not installed ({}), attach again after navigation",
                failure.message
            )),
            _ => HighlightError::EvaluationFailed(failure.message),
        }
    }
}

/// A Chrome tab seen through the injected page bridge
///
/// Every [`Dom`] call is one `Runtime.evaluate` round trip. The bridge lives
/// in the page, so a navigation drops it together with all node handles;
/// call [`PageDom::attach`] again afterwards.
pub struct PageDom {
    tab: Arc<Tab>,
}

impl PageDom {
    /// Install the bridge into `tab` (a no-op when it is already installed)
    pub fn attach(tab: Arc<Tab>) -> Result<Self> {
        let result = tab
            .evaluate(BRIDGE_JS, false)
            .map_err(|e| HighlightError::EvaluationFailed(format!("Failed to install page bridge: {}", e)))?;

        match result.value.as_ref().and_then(|v| v.as_str()) {
            Some("ready") => {
                log::debug!("Page bridge installed");
                Ok(Self { tab })
            }
            other => Err(HighlightError::BridgeProtocol(format!(
                "unexpected bridge install answer: {:?}",
                other
            ))),
        }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Whether the bridge is still present in the page
    pub fn is_attached(&self) -> bool {
        self.tab
            .evaluate("Boolean(window.__attributeHighlighter)", false)
            .ok()
            .and_then(|r| r.value)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn call<A: Serialize, T: DeserializeOwned>(&self, op: &str, args: A) -> Result<T> {
        let expression = call_expression(op, &args)?;

        let result = self
            .tab
            .evaluate(&expression, false)
            .map_err(|e| HighlightError::EvaluationFailed(format!("Bridge call '{}' failed: {}", op, e)))?;

        let json_value = result
            .value
            .ok_or_else(|| HighlightError::BridgeProtocol(format!("No value returned from '{}'", op)))?;

        // The bridge answers with a JSON string, parse it as a string first
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| HighlightError::BridgeProtocol(format!("Failed to get JSON string: {}", e)))?;

        parse_reply(op, &json_str)
    }

    /// Call for the `&self -> bool` / `&mut self -> Vec` trait methods, which cannot fail
    fn call_or_default<A: Serialize, T: DeserializeOwned + Default>(&self, op: &str, args: A) -> T {
        self.call(op, args).unwrap_or_else(|e| {
            log::debug!("Bridge call '{}' failed: {}", op, e);
            T::default()
        })
    }
}

fn call_expression<A: Serialize>(op: &str, args: &A) -> Result<String> {
    Ok(format!(
        "JSON.stringify(window.__attributeHighlighter \
         ? window.__attributeHighlighter.call({op}, {args}) \
         : {{ error: {{ code: 'missing', message: 'window.__attributeHighlighter is undefined', node: null }} }})",
        op = serde_json::to_string(op)?,
        args = serde_json::to_string(args)?,
    ))
}

fn parse_reply<T: DeserializeOwned>(op: &str, json_str: &str) -> Result<T> {
    let reply: Reply<T> = serde_json::from_str(json_str)
        .map_err(|e| HighlightError::BridgeProtocol(format!("Failed to parse '{}' reply: {}", op, e)))?;

    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Error(failure) => Err(failure.into()),
    }
}

impl Dom for PageDom {
    fn body(&self) -> Result<NodeId> {
        self.call("body", json!({}))
    }

    fn query_attribute(&self, attribute: &str) -> Result<Vec<NodeId>> {
        self.call("queryAttribute", json!({ "attribute": attribute }))
    }

    fn element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        self.call("elementById", json!({ "id": id }))
    }

    fn element(&self, node: NodeId) -> Result<ElementNode> {
        self.call("element", json!({ "node": node }))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        self.call("attribute", json!({ "node": node, "name": name }))
    }

    fn bounding_box(&self, node: NodeId) -> Result<Option<BoundingBox>> {
        self.call("boundingBox", json!({ "node": node }))
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.call("parent", json!({ "node": node }))
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.call_or_default("isConnected", json!({ "node": node }))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.call_or_default("contains", json!({ "ancestor": ancestor, "node": node }))
    }

    fn style_property(&self, node: NodeId, property: &str) -> Result<String> {
        self.call("styleProperty", json!({ "node": node, "property": property }))
    }

    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.call("setStyleProperty", json!({ "node": node, "property": property, "value": value }))
    }

    fn scroll_into_view(&mut self, node: NodeId, options: ScrollOptions) -> Result<()> {
        self.call("scrollIntoView", json!({ "node": node, "options": options }))
    }

    fn create_element(&mut self, tag_name: &str) -> Result<NodeId> {
        self.call("createElement", json!({ "tagName": tag_name }))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.call("appendChild", json!({ "parent": parent, "child": child }))
    }

    fn remove(&mut self, node: NodeId) -> Result<()> {
        self.call("remove", json!({ "node": node }))
    }

    fn clear_children(&mut self, node: NodeId) -> Result<()> {
        self.call("clearChildren", json!({ "node": node }))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.call("setAttribute", json!({ "node": node, "name": name, "value": value }))
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.call("removeAttribute", json!({ "node": node, "name": name }))
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.call("setText", json!({ "node": node, "text": text }))
    }

    fn observe(&mut self, target: NodeId, options: &ObserveOptions) -> Result<()> {
        self.call("observe", json!({ "target": target, "options": options }))
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.call::<_, ()>("disconnect", json!({})) {
            log::debug!("Bridge call 'disconnect' failed: {}", e);
        }
    }

    fn take_records(&mut self) -> Vec<MutationRecord> {
        self.call_or_default("takeRecords", json!({}))
    }

    fn take_events(&mut self) -> Vec<UserEvent> {
        self.call_or_default("takeEvents", json!({}))
    }
}
