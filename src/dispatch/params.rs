//! Declared parameter shape of a handler.

use crate::error::RouteError;
use serde_json::Value;
use std::collections::HashSet;

/// Name under which the raw request is passed; unusable as a named parameter.
pub const REQUEST_PARAM: &str = "request";

#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    /// Named parameter that must be present.
    Required(String),
    /// Named parameter filled with the given default when absent.
    Optional(String, Value),
    /// Accepts arbitrary named values; disables key filtering.
    Extra,
    /// Takes the raw request.
    Request,
}

impl Param {
    pub fn name(&self) -> Option<&str> {
        match self {
            Param::Required(n) | Param::Optional(n, _) => Some(n),
            Param::Extra | Param::Request => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamSpec {
    params: Vec<Param>,
}

impl ParamSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::Required(name.into()));
        self
    }

    pub fn optional(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Param::Optional(name.into(), default.into()));
        self
    }

    pub fn extra(mut self) -> Self {
        self.params.push(Param::Extra);
        self
    }

    pub fn request(mut self) -> Self {
        self.params.push(Param::Request);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn named(&self) -> impl Iterator<Item = &str> + '_ {
        self.params.iter().filter_map(Param::name)
    }

    pub fn has_named(&self) -> bool {
        self.named().next().is_some()
    }

    pub fn has_extra(&self) -> bool {
        self.params.contains(&Param::Extra)
    }

    pub fn has_request(&self) -> bool {
        self.params.contains(&Param::Request)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.named().any(|n| n == name)
    }

    /// Declaration checks: request last (only a catch-all may follow), unique names,
    /// no named parameter called `request`.
    pub fn validate(&self, method: &str, path: &str) -> Result<(), RouteError> {
        let mut seen = HashSet::new();
        let mut after_request = false;
        let mut extras = 0;
        for p in &self.params {
            if after_request && *p != Param::Extra {
                return Err(RouteError::MisplacedRequest {
                    method: method.to_string(),
                    path: path.to_string(),
                });
            }
            match p {
                Param::Request => after_request = true,
                Param::Extra => {
                    extras += 1;
                    if extras > 1 {
                        return Err(RouteError::DuplicateParam {
                            method: method.to_string(),
                            path: path.to_string(),
                            name: "**".to_string(),
                        });
                    }
                }
                Param::Required(name) | Param::Optional(name, _) => {
                    if name == REQUEST_PARAM {
                        return Err(RouteError::ReservedParam {
                            method: method.to_string(),
                            path: path.to_string(),
                            name: name.clone(),
                        });
                    }
                    if !seen.insert(name.as_str()) {
                        return Err(RouteError::DuplicateParam {
                            method: method.to_string(),
                            path: path.to_string(),
                            name: name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
