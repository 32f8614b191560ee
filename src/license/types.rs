//! License API wire types.
//!
//! Decoding is lenient below the envelope: a `null` or malformed module entry, or a
//! record with a missing or unrecognised `status`, decodes as not active instead of
//! failing the whole response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Envelope returned by `GET /ng/api/licenses/account`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLicensesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AccountLicenses>,
}

/// Per-account license summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLicenses {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Module type → license records, most relevant record first
    #[serde(default, deserialize_with = "lenient_module_licenses")]
    pub all_module_licenses: BTreeMap<String, Vec<ModuleLicense>>,
}

/// One license record for one module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLicense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub status: LicenseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<i64>,
}

/// License record status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    Active,
    Expired,
    Deleted,
    #[default]
    #[serde(other)]
    Unknown,
}

fn status_or_unknown<'de, D>(deserializer: D) -> Result<LicenseStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LicenseStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode the module map record by record.
///
/// Anything that is not an object decodes as an empty map, a module whose records are
/// not an array as no records, and a record that fails to decode as a record with
/// [`LicenseStatus::Unknown`].
fn lenient_module_licenses<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<ModuleLicense>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(modules) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };

    Ok(modules
        .into_iter()
        .map(|(module_type, records)| {
            let records = match records {
                Value::Array(records) => records
                    .into_iter()
                    .map(|record| {
                        serde_json::from_value(record).unwrap_or_else(|e| {
                            debug!(module_type = %module_type, error = %e, "Malformed license record");
                            ModuleLicense::default()
                        })
                    })
                    .collect(),
                _ => Vec::new(),
            };
            (module_type, records)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_ledger_response() {
        let body = json!({
            "status": "SUCCESS",
            "data": {
                "accountId": "acct-1",
                "allModuleLicenses": {
                    "CI": [{"id": "l1", "moduleType": "CI", "status": "ACTIVE", "edition": "ENTERPRISE"}],
                    "CD": [{"moduleType": "CD", "status": "EXPIRED"}],
                    "CE": [{"moduleType": "CE", "status": "SUSPENDED_BY_BILLING"}]
                }
            }
        });

        let response: AccountLicensesResponse = serde_json::from_value(body).unwrap();
        let data = response.data.unwrap();

        assert_eq!(data.account_id.as_deref(), Some("acct-1"));
        assert_eq!(data.all_module_licenses["CI"][0].status, LicenseStatus::Active);
        assert_eq!(data.all_module_licenses["CD"][0].status, LicenseStatus::Expired);
        assert_eq!(data.all_module_licenses["CE"][0].status, LicenseStatus::Unknown);
    }

    #[test]
    fn test_decode_tolerates_malformed_modules() {
        let body = json!({
            "data": {
                "allModuleLicenses": {
                    "CI": [{"moduleType": "CI", "status": "ACTIVE"}],
                    "CF": null,
                    "CHAOS": [{"moduleType": "CHAOS"}],
                    "STO": [{"status": null}],
                    "SRM": [42, {"status": "ACTIVE"}],
                    "IDP": "garbage"
                }
            }
        });

        let response: AccountLicensesResponse = serde_json::from_value(body).unwrap();
        let modules = response.data.unwrap().all_module_licenses;

        assert_eq!(modules["CI"][0].status, LicenseStatus::Active);
        assert!(modules["CF"].is_empty());
        assert_eq!(modules["CHAOS"][0].status, LicenseStatus::Unknown);
        assert_eq!(modules["STO"][0].status, LicenseStatus::Unknown);
        assert_eq!(modules["SRM"][0].status, LicenseStatus::Unknown);
        assert_eq!(modules["SRM"][1].status, LicenseStatus::Active);
        assert!(modules["IDP"].is_empty());
    }

    #[test]
    fn test_decode_null_module_map() {
        let response: AccountLicensesResponse =
            serde_json::from_value(json!({"data": {"accountId": "acct-1", "allModuleLicenses": null}}))
                .unwrap();
        assert!(response.data.unwrap().all_module_licenses.is_empty());
    }

    #[test]
    fn test_decode_without_data() {
        let response: AccountLicensesResponse =
            serde_json::from_value(json!({"status": "ERROR"})).unwrap();
        assert!(response.data.is_none());
    }
}
