use std::collections::HashMap;

/// Path marker for the catch-all route
pub const CATCH_ALL: &str = "*";

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    RequiresAuth,
    RequiresAdmin,
}

/// The screen a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Login,
    Register,
    Profile,
    Users,
    UserDetail,
    UserManagement,
    NotFound,
}

impl View {
    /// Get the display title for this view.
    pub fn title(&self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Login => "Log in",
            View::Register => "Register",
            View::Profile => "Profile",
            View::Users => "Users",
            View::UserDetail => "User details",
            View::UserManagement => "User management",
            View::NotFound => "Not found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
    /// `None` means the route was never tagged; it is treated as public.
    pub visibility: Option<Visibility>,
}

impl RouteDescriptor {
    pub fn visibility(&self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Public)
    }

    /// Match `segments` against this route, returning captured parameters.
    fn matches(&self, segments: &[&str]) -> Option<HashMap<String, String>> {
        if self.path == CATCH_ALL {
            return Some(HashMap::new());
        }

        let pattern: Vec<&str> = split_path(self.path);
        if pattern.len() != segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (expected, actual) in pattern.iter().zip(segments) {
            if let Some(name) = expected.strip_prefix(':') {
                params.insert(name.to_string(), (*actual).to_string());
            } else if expected != actual {
                return None;
            }
        }
        Some(params)
    }
}

/// Application routes, matched in order.
pub static ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor {
        path: "/",
        name: "home",
        view: View::Home,
        visibility: None,
    },
    RouteDescriptor {
        path: "/login",
        name: "login",
        view: View::Login,
        visibility: Some(Visibility::Public),
    },
    RouteDescriptor {
        path: "/register",
        name: "register",
        view: View::Register,
        visibility: Some(Visibility::Public),
    },
    RouteDescriptor {
        path: "/profile",
        name: "profile",
        view: View::Profile,
        visibility: Some(Visibility::RequiresAuth),
    },
    RouteDescriptor {
        path: "/users",
        name: "users",
        view: View::Users,
        visibility: Some(Visibility::RequiresAuth),
    },
    RouteDescriptor {
        path: "/users/:id",
        name: "user-detail",
        view: View::UserDetail,
        visibility: Some(Visibility::RequiresAuth),
    },
    RouteDescriptor {
        path: "/admin/users",
        name: "user-management",
        view: View::UserManagement,
        visibility: Some(Visibility::RequiresAdmin),
    },
    RouteDescriptor {
        path: CATCH_ALL,
        name: "not-found",
        view: View::NotFound,
        visibility: None,
    },
];

/// A path matched against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: &'static RouteDescriptor,
    /// Normalized path: no query, no fragment, no empty segments.
    pub path: String,
    pub params: HashMap<String, String>,
}

impl ResolvedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Strip query and fragment, collapse slashes.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    let segments = split_path(&path[..end]);
    format!("/{}", segments.join("/"))
}

/// Resolve `path` against `ROUTES`. The catch-all guarantees a match.
pub fn resolve(path: &str) -> ResolvedRoute {
    let path = normalize_path(path);
    let segments = split_path(&path);

    let (route, params) = ROUTES
        .iter()
        .find_map(|route| route.matches(&segments).map(|params| (route, params)))
        .unwrap_or((&ROUTES[ROUTES.len() - 1], HashMap::new()));

    ResolvedRoute { route, path, params }
}

pub fn find_by_name(name: &str) -> Option<&'static RouteDescriptor> {
    ROUTES.iter().find(|r| r.name == name)
}
