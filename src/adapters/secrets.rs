//! Secret and ConfigMap fetching utilities

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};

use crate::error::{Error, Result};

/// Fetch a secret from Kubernetes, `None` if it does not exist
pub async fn get_secret(client: &Client, name: &str, namespace: &str) -> Result<Option<Secret>> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    Ok(secrets.get_opt(name).await?)
}

/// Fetch a config map from Kubernetes, `None` if it does not exist
pub async fn get_config_map(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<Option<ConfigMap>> {
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    Ok(config_maps.get_opt(name).await?)
}

/// Get a string value from a secret
pub fn get_secret_string(secret: &Secret, key: &str) -> Result<String> {
    let missing = || Error::SecretKeyNotFound {
        secret: secret.metadata.name.clone().unwrap_or_default(),
        key: key.to_string(),
    };

    let bytes = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .ok_or_else(missing)?;

    String::from_utf8(bytes.0.clone())
        .map_err(|e| Error::Config(format!("Invalid UTF-8 in secret key '{}': {}", key, e)))
}

/// Get the first present key of a secret, in order of preference
pub fn get_secret_string_any(secret: &Secret, keys: &[&str]) -> Result<String> {
    let mut last_err = None;
    for key in keys {
        match get_secret_string(secret, key) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::config("no secret keys requested")))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::ByteString;

    use super::*;

    fn secret(entries: &[(&str, &str)]) -> Secret {
        let data: BTreeMap<String, ByteString> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
            .collect();
        Secret {
            metadata: ObjectMeta {
                name: Some("rook-ceph-mon".to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn missing_key_names_secret_and_key() {
        let err = get_secret_string(&secret(&[]), "fsid").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Secret key 'fsid' not found in secret 'rook-ceph-mon'"
        );
    }

    #[test]
    fn falls_back_to_later_keys() {
        let s = secret(&[("admin-secret", "AQB==")]);
        let value = get_secret_string_any(&s, &["ceph-secret", "admin-secret"]).unwrap();
        assert_eq!(value, "AQB==");
    }
}
