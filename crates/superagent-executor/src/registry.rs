use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::Tool;

/// Registry of tools available to the executor (spec §4.4 "Tool Registry").
/// Tool definitions are shared and immutable after registration (spec §3
/// Ownership); re-registering a name replaces rather than duplicates the
/// entry (spec §8: "Registering a tool is idempotent").
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::error::ExecutorError;
    use crate::schema::ToolSchema;

    struct NoopTool(&'static str);

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            self.0
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::default()
        }

        async fn call(&self, _params: Value) -> Result<String, ExecutorError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn re_registering_same_name_replaces_not_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NoopTool("echo")));
        registry.register(Arc::new(NoopTool("echo")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["echo".to_string()]);
    }

    #[test]
    fn find_returns_none_for_unknown_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.find("missing").is_none());
    }
}
