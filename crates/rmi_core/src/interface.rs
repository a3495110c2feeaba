//! Remote interface descriptors and eager validation.
//!
//! The [`remote_interface`](crate::remote_interface) macro derives one
//! static [`InterfaceDescriptor`] per trait. Skeletons use it to resolve
//! incoming requests by `(method, argument types)`; stubs embed it in
//! their identity. Both run [`validate`] at construction so that a
//! descriptor that fails the remote-interface predicate is rejected before
//! any network activity.

use crate::error::RmiError;
use crate::proto::Request;

/// One named operation of a remote interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    /// Normalized token strings of the parameter types, in order.
    pub param_types: &'static [&'static str],
    /// Normalized token string of the success value type.
    pub return_type: &'static str,
    /// Whether the method's result declares the RMI error kind.
    pub declares_rmi_error: bool,
}

impl MethodDescriptor {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.param_types.join(", "))
    }
}

/// A remote interface: a name and its ordered method set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub name: &'static str,
    pub methods: &'static [MethodDescriptor],
}

impl InterfaceDescriptor {
    /// Exact lookup by method name and argument type list.
    pub fn find(&self, method: &str, arg_types: &[String]) -> Option<&'static MethodDescriptor> {
        self.methods.iter().find(|m| {
            m.name == method
                && m.param_types.len() == arg_types.len()
                && m.param_types.iter().zip(arg_types).all(|(p, a)| *p == a.as_str())
        })
    }
}

/// Check the remote-interface predicate.
///
/// Every method must declare the RMI error kind in its result, and no two
/// methods may share a signature. Violations are programmer errors and
/// panic: a descriptor that fails here cannot be made to work at runtime,
/// the program itself has to change.
pub fn validate(descriptor: &InterfaceDescriptor) {
    for method in descriptor.methods {
        if !method.declares_rmi_error {
            panic!(
                "{} is not a remote interface: method {} does not declare the RMI error kind",
                descriptor.name,
                method.signature()
            );
        }
    }
    for (i, method) in descriptor.methods.iter().enumerate() {
        for other in &descriptor.methods[i + 1..] {
            if method.name == other.name && method.param_types == other.param_types {
                panic!(
                    "{} has colliding method signatures: {}",
                    descriptor.name,
                    method.signature()
                );
            }
        }
    }
}

/// Resolve the target method of a request, or explain why there is none.
pub fn resolve_method(
    descriptor: &InterfaceDescriptor,
    request: &Request,
) -> Result<&'static MethodDescriptor, RmiError> {
    let method = descriptor
        .find(&request.method, &request.arg_types)
        .ok_or_else(|| {
            RmiError::new(format!(
                "no matching method: {}::{}({})",
                descriptor.name,
                request.method,
                request.arg_types.join(", ")
            ))
        })?;
    if request.args.len() != method.param_types.len() {
        return Err(RmiError::new(
            "invalid request object: argument arity mismatch",
        ));
    }
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    static PING: InterfaceDescriptor = InterfaceDescriptor {
        name: "PingServer",
        methods: &[MethodDescriptor {
            name: "ping",
            param_types: &["i32"],
            return_type: "String",
            declares_rmi_error: true,
        }],
    };

    static NOT_REMOTE: InterfaceDescriptor = InterfaceDescriptor {
        name: "Plain",
        methods: &[MethodDescriptor {
            name: "run",
            param_types: &[],
            return_type: "()",
            declares_rmi_error: false,
        }],
    };

    static COLLIDING: InterfaceDescriptor = InterfaceDescriptor {
        name: "Colliding",
        methods: &[
            MethodDescriptor {
                name: "go",
                param_types: &["u8"],
                return_type: "()",
                declares_rmi_error: true,
            },
            MethodDescriptor {
                name: "go",
                param_types: &["u8"],
                return_type: "String",
                declares_rmi_error: true,
            },
        ],
    };

    #[test]
    fn test_valid_interface_passes() {
        validate(&PING);
    }

    #[test]
    #[should_panic(expected = "not a remote interface")]
    fn test_missing_error_kind_rejected() {
        validate(&NOT_REMOTE);
    }

    #[test]
    #[should_panic(expected = "colliding method signatures")]
    fn test_signature_collision_rejected() {
        validate(&COLLIDING);
    }

    #[test]
    fn test_resolution_is_exact() {
        let hit = Request::new("ping", vec!["i32".to_owned()], vec![vec![]]);
        assert!(resolve_method(&PING, &hit).is_ok());

        let wrong_name = Request::new("pong", vec!["i32".to_owned()], vec![vec![]]);
        assert!(resolve_method(&PING, &wrong_name).is_err());

        let wrong_types = Request::new("ping", vec!["u64".to_owned()], vec![vec![]]);
        assert!(resolve_method(&PING, &wrong_types).is_err());

        let wrong_arity = Request::new("ping", vec![], vec![]);
        assert!(resolve_method(&PING, &wrong_arity).is_err());
    }
}
