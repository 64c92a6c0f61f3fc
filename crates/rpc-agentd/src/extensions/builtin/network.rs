//! `network` namespace.

use serde_json::{Value, json};

use crate::error::RpcError;
use crate::extensions::{Extension, Method, ParamSchema, ParamType, Params};

pub(super) fn extension() -> Extension {
    Extension::builder("network")
        .version("1.0.0")
        .description("Network helper methods")
        .method(
            Method::new("validatePort", validate_port).with_schema(
                ParamSchema::new()
                    .require("port", ParamType::Number)
                    .require("type", ParamType::String),
            ),
        )
        .build()
}

fn validate_port(params: &Params) -> Result<Value, RpcError> {
    let port = params.get("port").cloned().unwrap_or(Value::Null);
    let kind = params.require_str("type")?.to_ascii_uppercase();

    let port_ok = port
        .as_u64()
        .is_some_and(|number| (1..=u64::from(u16::MAX)).contains(&number));
    let kind_ok = matches!(kind.as_str(), "TCP" | "UDP");

    Ok(json!({
        "valid": port_ok && kind_ok,
        "port": port,
        "type": kind,
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn call(port: Value, kind: &str) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("port".into(), port);
        map.insert("type".into(), json!(kind));
        validate_port(&Params::new(map)).expect("validatePort succeeds")
    }

    #[rstest]
    #[case::tcp(json!(8080), "TCP", true)]
    #[case::lowercase_udp(json!(53), "udp", true)]
    #[case::upper_bound(json!(65535), "tcp", true)]
    #[case::zero(json!(0), "TCP", false)]
    #[case::too_large(json!(65536), "TCP", false)]
    #[case::negative(json!(-1), "TCP", false)]
    #[case::fractional(json!(80.5), "TCP", false)]
    #[case::unknown_type(json!(80), "SCTP", false)]
    fn validates_port_and_type(#[case] port: Value, #[case] kind: &str, #[case] valid: bool) {
        let result = call(port.clone(), kind);
        assert_eq!(result["valid"], json!(valid));
        assert_eq!(result["port"], port);
        assert_eq!(result["type"], json!(kind.to_ascii_uppercase()));
    }
}
