//! Name-keyed payment gateway registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{GatewaySettings, PaymentsConfig};
use crate::payments::gateway::{PaymentError, PaymentGateway};
use crate::payments::stripe::StripeGateway;

/// Gateway implementations keyed by name.
///
/// Populated once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<&'static str, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in gateway.
    pub fn with_defaults() -> Self {
        Self::new().register(Arc::new(StripeGateway::new()))
    }

    pub fn register(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateways.insert(gateway.name(), gateway);
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(kind).cloned()
    }

    /// Look up a configured gateway instance by name and its implementation.
    pub fn resolve<'a>(
        &self,
        config: &'a PaymentsConfig,
        name: &str,
    ) -> Result<(Arc<dyn PaymentGateway>, &'a GatewaySettings), PaymentError> {
        let settings = config
            .gateway(name)
            .ok_or_else(|| PaymentError::UnknownGateway(name.to_string()))?;
        let gateway = self.get(&settings.kind).ok_or_else(|| {
            tracing::warn!(gateway = %name, kind = %settings.kind, "No payment gateway registered for kind");
            PaymentError::UnknownGateway(name.to_string())
        })?;
        Ok((gateway, settings))
    }

    /// Registered names, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.gateways.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Run `created_pay` for every configured gateway instance.
    ///
    /// A failing gateway is logged and skipped; the others still run.
    pub async fn announce(&self, config: &PaymentsConfig) {
        for settings in &config.gateways {
            let Some(gateway) = self.get(&settings.kind) else {
                tracing::warn!(gateway = %settings.name, kind = %settings.kind, "No payment gateway registered for kind");
                continue;
            };

            let notify_url = config.notify_url(&settings.name);
            match gateway.created_pay(&notify_url, settings).await {
                Ok(()) => tracing::info!(gateway = %settings.name, notify_url = %notify_url, "Payment gateway ready"),
                Err(e) => tracing::error!(gateway = %settings.name, error = %e, "Payment gateway setup failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::gateway::{CallbackRequest, PayMethod, PayNotify, PayOrder, PayRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGateway {
        name: &'static str,
        fail_setup: bool,
        setups: AtomicUsize,
    }

    impl FakeGateway {
        fn new(name: &'static str, fail_setup: bool) -> Self {
            Self {
                name,
                fail_setup,
                setups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn pay(&self, order: &PayOrder, _settings: &GatewaySettings) -> Result<PayRequest, PaymentError> {
            Ok(PayRequest {
                method: PayMethod::Redirect,
                url: format!("https://pay.example.com/{}", order.trade_no),
                gateway_no: None,
            })
        }

        async fn created_pay(&self, _notify_url: &str, _settings: &GatewaySettings) -> Result<(), PaymentError> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            if self.fail_setup {
                return Err(PaymentError::InvalidConfig("missing key".into()));
            }
            Ok(())
        }

        async fn handle_callback(
            &self,
            request: &CallbackRequest,
            _settings: &GatewaySettings,
        ) -> Result<PayNotify, PaymentError> {
            Ok(PayNotify {
                trade_no: request.body.clone(),
                gateway_no: "g-1".into(),
            })
        }
    }

    fn settings(name: &str, kind: &str) -> GatewaySettings {
        GatewaySettings {
            name: name.into(),
            kind: kind.into(),
            config: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = GatewayRegistry::with_defaults().register(Arc::new(FakeGateway::new("fake", false)));
        assert_eq!(registry.kinds(), vec!["fake", "stripe"]);
        assert!(registry.get("stripe").is_some());
        assert!(registry.get("epay").is_none());
    }

    #[test]
    fn test_resolve_configured_gateway() {
        let registry = GatewayRegistry::new().register(Arc::new(FakeGateway::new("fake", false)));
        let config = PaymentsConfig {
            public_base_url: String::new(),
            gateways: vec![settings("main", "fake"), settings("legacy", "epay")],
        };

        let (gateway, found) = registry.resolve(&config, "main").unwrap();
        assert_eq!(gateway.name(), "fake");
        assert_eq!(found.name, "main");

        for name in ["legacy", "missing"] {
            match registry.resolve(&config, name) {
                Err(PaymentError::UnknownGateway(n)) => assert_eq!(n, name),
                _ => panic!("{} should not resolve", name),
            }
        }
    }

    #[tokio::test]
    async fn test_announce_isolates_failures() {
        let broken = Arc::new(FakeGateway::new("broken", true));
        let healthy = Arc::new(FakeGateway::new("healthy", false));
        let registry = GatewayRegistry::new()
            .register(broken.clone())
            .register(healthy.clone());

        let config = PaymentsConfig {
            public_base_url: "https://relay.example.com".into(),
            gateways: vec![
                settings("a", "broken"),
                settings("b", "unknown"),
                settings("c", "healthy"),
            ],
        };
        registry.announce(&config).await;

        assert_eq!(broken.setups.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.setups.load(Ordering::SeqCst), 1);
    }
}
