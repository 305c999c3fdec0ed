/// Request-scoped trace identifiers attached to every log line emitted
/// through the [`Logger`](crate::domain::logger::Logger) port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    link_id: Option<String>,
    link_root_span: Option<String>,
    param_flag: Option<String>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for work done on behalf of a task; the task id becomes the link id.
    pub fn for_task(task_id: impl Into<String>) -> Self {
        Self::new().with_link_id(task_id)
    }

    pub fn with_link_id(mut self, link_id: impl Into<String>) -> Self {
        self.link_id = non_empty(link_id.into());
        self
    }

    pub fn with_root_span(mut self, root_span: impl Into<String>) -> Self {
        self.link_root_span = non_empty(root_span.into());
        self
    }

    pub fn with_param_flag(mut self, flag: impl Into<String>) -> Self {
        self.param_flag = non_empty(flag.into());
        self
    }

    pub fn link_id(&self) -> Option<&str> {
        self.link_id.as_deref()
    }

    pub fn link_root_span(&self) -> Option<&str> {
        self.link_root_span.as_deref()
    }

    pub fn param_flag(&self) -> Option<&str> {
        self.param_flag.as_deref()
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
