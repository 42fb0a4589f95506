use crate::gate::{ExecutionContext, GateOutcome, HistoryMode, LOGIN_ROUTE, Navigation, SessionGate};

/// RouteTable
///
/// The set of route prefixes that carry the auth guard. A prefix guards itself and every
/// path below it (`/my-posts` guards `/my-posts/12`, not `/my-posts-archive`).
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    gated: Vec<String>,
}

impl RouteTable {
    pub fn new<I, S>(gated: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for route in gated {
            let route = route.into();
            let route = route.trim_end_matches('/').to_string();
            // The login page can never be guarded, or a failed check would loop.
            if route.is_empty() || route == LOGIN_ROUTE || table.gated.contains(&route) {
                continue;
            }
            table.gated.push(route);
        }
        table
    }

    pub fn is_gated(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.gated.iter().any(|route| {
            path == route
                || path
                    .strip_prefix(route.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn routes(&self) -> &[String] {
        &self.gated
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// NavigationResult
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationResult {
    /// The navigation committed. For a guarded route it carries the user annotation.
    Committed(Navigation),
    /// The gate rejected `attempted`; the login route replaced the current entry.
    Redirected { attempted: String, target: String },
}

/// Navigator
///
/// Client-side router. Each transition to a guarded route is held until the session
/// gate resolves, and only then lands in the history stack. Transitions are taken through
/// `&mut self`, so one navigation resolves completely before the next starts.
pub struct Navigator {
    gate: SessionGate,
    ctx: ExecutionContext,
    routes: RouteTable,
    history: Vec<String>,
    current: Option<Navigation>,
}

impl Navigator {
    pub fn new(gate: SessionGate, ctx: ExecutionContext, routes: RouteTable) -> Self {
        Self {
            gate,
            ctx,
            routes,
            history: Vec::new(),
            current: None,
        }
    }

    pub async fn push(&mut self, to: &str) -> NavigationResult {
        self.navigate(to, HistoryMode::Push).await
    }

    pub async fn replace(&mut self, to: &str) -> NavigationResult {
        self.navigate(to, HistoryMode::Replace).await
    }

    pub fn current(&self) -> Option<&Navigation> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    async fn navigate(&mut self, to: &str, mode: HistoryMode) -> NavigationResult {
        let mut navigation = Navigation::new(to).with_mode(mode);
        if let Some(current) = &self.current {
            navigation = navigation.from_route(current.to.clone());
        }

        if !self.routes.is_gated(to) {
            self.commit(navigation.clone());
            return NavigationResult::Committed(navigation);
        }

        match self.gate.guard(&self.ctx, &mut navigation, None).await {
            GateOutcome::Proceed { .. } => {
                self.commit(navigation.clone());
                NavigationResult::Committed(navigation)
            }
            GateOutcome::Redirect { target, mode } => {
                let mut redirect = Navigation::new(target.clone()).with_mode(mode);
                redirect.from = navigation.from.clone();
                self.commit(redirect);
                NavigationResult::Redirected {
                    attempted: navigation.to,
                    target,
                }
            }
        }
    }

    fn commit(&mut self, navigation: Navigation) {
        match navigation.mode {
            HistoryMode::Replace if !self.history.is_empty() => {
                if let Some(last) = self.history.last_mut() {
                    *last = navigation.to.clone();
                }
            }
            _ => self.history.push(navigation.to.clone()),
        }
        self.current = Some(navigation);
    }
}
