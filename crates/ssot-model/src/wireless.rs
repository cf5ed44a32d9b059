//! Wireless LANs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::de::null_default;
use crate::field::Field;
use crate::ipam::Vlan;
use crate::object::{Header, NetboxObject};
use crate::tenancy::Tenant;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WirelessLanGroup {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub parent: Option<Arc<WirelessLanGroup>>,
}

resource!(
    WirelessLanGroup,
    "/api/wireless/wireless-lan-groups/",
    "wireless.wirelesslangroup",
    orphan
);

impl NetboxObject for WirelessLanGroup {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("parent", &self.parent),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Operational status of a wireless LAN.
    WirelessLanStatus {
        Active => ("active", "Active"),
        Reserved => ("reserved", "Reserved"),
        Disabled => ("disabled", "Disabled"),
        Deprecated => ("deprecated", "Deprecated"),
    }
);

choice!(
    WirelessLanAuthType {
        Open => ("open", "Open"),
        Wep => ("wep", "WEP"),
        WpaPersonal => ("wpa-personal", "WPA Personal (PSK)"),
        WpaEnterprise => ("wpa-enterprise", "WPA Enterprise"),
    }
);

choice!(
    WirelessLanAuthCipher {
        Auto => ("auto", "Auto"),
        Tkip => ("tkip", "TKIP"),
        Aes => ("aes", "AES"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WirelessLan {
    #[serde(flatten)]
    pub header: Header,
    pub ssid: String,
    pub group: Option<Arc<WirelessLanGroup>>,
    pub status: Option<WirelessLanStatus>,
    pub vlan: Option<Arc<Vlan>>,
    pub tenant: Option<Arc<Tenant>>,
    pub auth_type: Option<WirelessLanAuthType>,
    pub auth_cipher: Option<WirelessLanAuthCipher>,
    #[serde(deserialize_with = "null_default")]
    pub auth_psk: String,
    #[serde(deserialize_with = "null_default")]
    pub comments: String,
}

resource!(WirelessLan, "/api/wireless/wireless-lans/", "wireless.wirelesslan", orphan);

impl NetboxObject for WirelessLan {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("ssid", self.ssid.clone()),
            Field::reference("group", &self.group),
            Field::choice("status", self.status),
            Field::reference("vlan", &self.vlan),
            Field::reference("tenant", &self.tenant),
            Field::choice("auth_type", self.auth_type),
            Field::choice("auth_cipher", self.auth_cipher),
            Field::scalar("auth_psk", self.auth_psk.clone()),
            Field::scalar("comments", self.comments.clone()),
        ]
    }

    fn display_key(&self) -> String {
        self.ssid.clone()
    }
}
