use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyPairReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyPairInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    pub fingerprint: String,

    /// OpenSSH `ssh-rsa ...` line
    pub public_key: String,

    /// PKCS#1 PEM
    pub private_key: String,

    pub vm_user_id: String,

    pub key_value_list: Vec<KeyValue>,
}
