use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "mma.v1";

/// Run bookkeeping attached to a crawl's result envelope.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl Meta {
    /// Wall time since `started`, tagged with the crawl's run ID.
    pub fn timed(started: Instant, run_id: &str) -> Self {
        Self { duration_ms: Some(started.elapsed().as_millis()), run_id: Some(run_id.to_string()) }
    }
}

/// One line on stdout per command: the plan before a crawl (`apply: false`) or its
/// summary after (`apply: true`).
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        let mut env = Self::stamped(op, false, meta);
        env.plan = Some(serde_json::to_value(plan)?);
        Ok(env)
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        let mut env = Self::stamped(op, true, meta);
        env.result = Some(serde_json::to_value(result)?);
        Ok(env)
    }

    fn stamped(op: &'static str, apply: bool, meta: Option<Meta>) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            time: Utc::now(),
            request_id: Uuid::new_v4(),
            op,
            apply,
            plan: None,
            result: None,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn crawl_plan_has_no_result_or_meta() {
        let plan = json!({"start_year": 2024, "end_year": 2023, "leagues": ["ufc"]});
        let env = Envelope::plan("crawl_espn", &plan, None).unwrap();
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["schema_version"], "mma.v1");
        assert_eq!(v["op"], "crawl_espn");
        assert_eq!(v["apply"], false);
        assert_eq!(v["plan"]["leagues"][0], "ufc");
        assert!(v.get("result").is_none());
        assert!(v.get("meta").is_none());
    }

    #[test]
    fn timed_result_carries_run_id() {
        let started = Instant::now();
        let env = Envelope::result("crawl_ufc", &json!({"fighters": 2, "errors": 0}), Some(Meta::timed(started, "run-7"))).unwrap();
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["apply"], true);
        assert_eq!(v["result"]["fighters"], 2);
        assert_eq!(v["meta"]["run_id"], "run-7");
        assert!(v["meta"]["duration_ms"].is_u64());
        assert!(v.get("plan").is_none());
    }

    #[test]
    fn each_envelope_gets_its_own_request_id() {
        let a = Envelope::result("retry", &json!({}), None).unwrap();
        let b = Envelope::result("retry", &json!({}), None).unwrap();
        assert_ne!(a.request_id, b.request_id);
    }
}
