//! Path → view table for the pages the app serves.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    UserProfile,
    Login,
    Archives,
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
}

pub const ROUTES: &[Route] = &[
    Route { path: "/", name: "home", view: View::Home },
    Route { path: "/users/:id", name: "user", view: View::UserProfile },
    Route { path: "/login", name: "login", view: View::Login },
    Route { path: "/archives", name: "archives", view: View::Archives },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub name: &'static str,
    pub view: View,
    pub params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_route(route: &Route, path_segments: &[&str]) -> Option<HashMap<String, String>> {
    let pattern = segments(route.path);
    if pattern.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern.iter().zip(path_segments) {
        if let Some(name) = expected.strip_prefix(':') {
            let decoded = urlencoding::decode(actual)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| actual.to_string());
            params.insert(name.to_string(), decoded);
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}

/// Finds the view for `path`. Query strings and trailing slashes are ignored.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = path.split('?').next().unwrap_or_default();
    let path_segments = segments(path);

    ROUTES.iter().find_map(|route| {
        match_route(route, &path_segments).map(|params| RouteMatch {
            name: route.name,
            view: route.view,
            params,
        })
    })
}

/// Builds the path of a named route, filling `:param` segments.
pub fn path_for(name: &str, params: &[(&str, &str)]) -> Option<String> {
    let route = ROUTES.iter().find(|r| r.name == name)?;
    if route.path == "/" {
        return Some("/".to_string());
    }

    let mut path = String::new();
    for segment in segments(route.path) {
        path.push('/');
        match segment.strip_prefix(':') {
            Some(key) => {
                let (_, value) = params.iter().find(|(k, _)| *k == key)?;
                path.push_str(&urlencoding::encode(value));
            }
            None => path.push_str(segment),
        }
    }
    Some(path)
}
