use crate::error::Result;
use crate::events::WindowId;
use crate::model::ActivityRegistry;
use std::sync::Arc;
use tracing::{debug, info};
use zbus::{connection, fdo, interface, Connection};

pub const BUS_NAME: &str = "org.sugarlabs.Shell";
pub const OBJECT_PATH: &str = "/org/sugarlabs/Shell/ActivityRegistry";

/// D-Bus фасад реестра активностей: активности сами сообщают о своих окнах
pub struct RegistryInterface {
    registry: Arc<ActivityRegistry>,
}

impl RegistryInterface {
    pub fn new(registry: Arc<ActivityRegistry>) -> Self {
        Self { registry }
    }
}

#[interface(name = "org.sugarlabs.Shell.ActivityRegistry")]
impl RegistryInterface {
    fn register(&self, activity_id: String, window: u32) -> fdo::Result<()> {
        debug!("D-Bus Register({}, 0x{:x})", activity_id, window);
        self.registry
            .register(WindowId(window), &activity_id)
            .map_err(|e| fdo::Error::InvalidArgs(e.to_string()))
    }

    fn unregister(&self, activity_id: String) -> bool {
        debug!("D-Bus Unregister({})", activity_id);
        self.registry.unregister(&activity_id)
    }

    fn list_running(&self) -> Vec<String> {
        self.registry
            .list_running()
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    /// 0, если активность неизвестна
    fn get_window(&self, activity_id: String) -> u32 {
        self.registry
            .get_window(&activity_id)
            .map(|w| w.value())
            .unwrap_or(0)
    }
}

/// Опубликовать реестр на сессионной шине. Соединение нужно держать живым.
pub async fn serve_registry(registry: Arc<ActivityRegistry>) -> Result<Connection> {
    let connection = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, RegistryInterface::new(registry))?
        .build()
        .await?;

    info!("Реестр активностей опубликован на D-Bus: {} {}", BUS_NAME, OBJECT_PATH);
    Ok(connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_forwards_to_registry() {
        let registry = Arc::new(ActivityRegistry::new());
        let iface = RegistryInterface::new(registry.clone());

        iface.register("org.laptop.Chat-1".to_string(), 0x2a).unwrap();
        assert!(iface.register(String::new(), 1).is_err());

        assert_eq!(iface.list_running(), vec!["org.laptop.Chat-1".to_string()]);
        assert_eq!(iface.get_window("org.laptop.Chat-1".to_string()), 0x2a);
        assert_eq!(iface.get_window("missing".to_string()), 0);
        assert!(iface.unregister("org.laptop.Chat-1".to_string()));
        assert!(registry.list_running().is_empty());
    }
}
