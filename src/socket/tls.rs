use crate::base::neterror::NetError;
use boring::ssl::{SslConnectorBuilder, SslVerifyMode, SslVersion};

/// TLS parameters carried in the per-request connect options.
///
/// Connect callbacks receive this through `ConnectOptions::tls` and hand it
/// to [`ConnectJob::tls`](crate::socket::connectjob::ConnectJob::tls), or to
/// their own TLS stack.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    /// OpenSSL cipher string; empty keeps the BoringSSL default.
    pub cipher_list: String,
    pub alpn_protos: Vec<String>,
    /// Curve names like "X25519", "P-256".
    pub curves: Vec<String>,
    /// Verify the peer certificate chain and hostname.
    pub verify_peer: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            cipher_list: String::new(),
            // The request pipeline speaks HTTP/1.1 only.
            alpn_protos: vec!["http/1.1".to_string()],
            curves: vec!["X25519".to_string(), "P-256".to_string(), "P-384".to_string()],
            verify_peer: true,
        }
    }
}

impl TlsConfig {
    /// Defaults with certificate verification turned off.
    ///
    /// Meant for self-signed test servers.
    pub fn insecure() -> Self {
        Self {
            verify_peer: false,
            ..Self::default()
        }
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder.set_min_proto_version(Some(min)).map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder.set_max_proto_version(Some(max)).map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.cipher_list.is_empty() {
            builder.set_cipher_list(&self.cipher_list).map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            builder.set_alpn_protos(&self.alpn_wire()?).map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.curves.is_empty() {
            let curves_str = self.curves.join(":");
            builder.set_curves_list(&curves_str).map_err(|_| NetError::SslProtocolError)?;
        }

        builder.set_verify(if self.verify_peer { SslVerifyMode::PEER } else { SslVerifyMode::NONE });

        Ok(())
    }

    /// ALPN protocol list in wire format (length-prefixed).
    fn alpn_wire(&self) -> Result<Vec<u8>, NetError> {
        let mut wire = Vec::new();
        for proto in &self.alpn_protos {
            let len = u8::try_from(proto.len()).map_err(|_| NetError::SslProtocolError)?;
            wire.push(len);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }

    /// Check if SNI (Server Name Indication) should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.trim_start_matches('[').trim_end_matches(']').parse::<std::net::IpAddr>().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boring::ssl::{SslConnector, SslMethod};

    #[test]
    fn test_default_applies() {
        let config = TlsConfig::default();
        assert!(config.verify_peer);
        assert_eq!(config.alpn_protos, vec!["http/1.1".to_string()]);

        let mut builder = SslConnector::builder(SslMethod::tls()).unwrap();
        assert!(config.apply_to_builder(&mut builder).is_ok());
    }

    #[test]
    fn test_insecure_disables_verification() {
        let config = TlsConfig::insecure();
        assert!(!config.verify_peer);

        let mut builder = SslConnector::builder(SslMethod::tls()).unwrap();
        assert!(config.apply_to_builder(&mut builder).is_ok());
    }

    #[test]
    fn test_alpn_wire_format() {
        let config = TlsConfig {
            alpn_protos: vec!["h2".to_string(), "http/1.1".to_string()],
            ..TlsConfig::default()
        };
        assert_eq!(config.alpn_wire().unwrap(), b"\x02h2\x08http/1.1".to_vec());
    }

    #[test]
    fn test_oversized_alpn_rejected() {
        let config = TlsConfig {
            alpn_protos: vec!["x".repeat(300)],
            ..TlsConfig::default()
        };
        assert!(matches!(config.alpn_wire(), Err(NetError::SslProtocolError)));
    }

    #[test]
    fn test_sni_skipped_for_ip_literals() {
        assert!(TlsConfig::should_set_sni("example.com"));
        assert!(!TlsConfig::should_set_sni("127.0.0.1"));
        assert!(!TlsConfig::should_set_sni("[::1]"));
    }
}
