/// The X-Ray propagation header carried in `_X_AMZN_TRACE_ID`, e.g.
/// `Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHeader {
    pub root: String,
    pub parent: Option<String>,
    /// `None` when the sampling decision is deferred (`Sampled=?`) or absent.
    pub sampled: Option<bool>,
}

impl TraceHeader {
    /// Returns `None` when the header carries no `Root` entry.
    pub fn parse(header: &str) -> Option<Self> {
        let mut root = None;
        let mut parent = None;
        let mut sampled = None;

        for part in header.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "Root" if !value.is_empty() => root = Some(value.to_string()),
                "Parent" if !value.is_empty() => parent = Some(value.to_string()),
                "Sampled" => {
                    sampled = match value {
                        "1" => Some(true),
                        "0" => Some(false),
                        _ => None,
                    }
                }
                _ => {}
            }
        }

        root.map(|root| Self {
            root,
            parent,
            sampled,
        })
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled == Some(true)
    }
}
