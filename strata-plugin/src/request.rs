use itertools::Itertools;

/// Mount prefix used by [Request::new]: `/plugins/{operator}/{args..}`.
pub const DEFAULT_MOUNT: &str = "plugins";

/// An already-decoded plugin request: an operator token plus positional
/// arguments.
///
/// ```rust
/// use strata_plugin::Request;
///
/// let request = Request::from_uri("/plugins/find/a/b");
/// assert_eq!(request.operator(), "find");
/// assert_eq!(request.args(), &["a".to_string(), "b".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    uri: String,
    operator: String,
    args: Vec<String>,
}

impl Request {
    /// Splits `uri` on `/`. The first two segments are the mount prefix, the
    /// next one is the operator and the rest are arguments.
    pub fn from_uri(uri: &str) -> Request {
        let mut tokens = uri.split('/').skip(2);
        let operator = tokens.next().unwrap_or_default().to_string();
        let args = tokens.map(|token| token.to_string()).collect();
        Request {
            uri: uri.to_string(),
            operator,
            args,
        }
    }

    pub fn new(operator: &str, args: &[&str]) -> Request {
        let uri = std::iter::once(operator).chain(args.iter().copied()).join("/");
        Request {
            uri: format!("/{}/{}", DEFAULT_MOUNT, uri),
            operator: operator.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(|arg| arg.as_str())
    }
}
