use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::activity::{Activity, ActivityId};
use crate::error::{Result, ShellError};
use crate::events::WindowId;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered { activity_id: ActivityId, window: WindowId },
    Unregistered { activity_id: ActivityId },
}

/// In-process registry of activity windows.
///
/// Activities announce their windows here instead of the shell querying the
/// window manager, which also works on sessions without a global window list.
pub struct ActivityRegistry {
    windows: RwLock<Vec<(ActivityId, WindowId)>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            windows: RwLock::new(Vec::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn register(&self, window: WindowId, activity_id: &str) -> Result<()> {
        if activity_id.trim().is_empty() {
            return Err(ShellError::InvalidActivity(
                "activity_id не может быть пустым".to_string(),
            ));
        }

        let key = ActivityId::new(activity_id);
        {
            let mut windows = self.windows.write();
            match windows.iter_mut().find(|(id, _)| id == &key) {
                Some(entry) => entry.1 = window,
                None => windows.push((key.clone(), window)),
            }
        }

        info!("Зарегистрирована активность {} с окном {}", key, window);
        // Нет подписчиков - не ошибка
        let _ = self.events.send(RegistryEvent::Registered {
            activity_id: key,
            window,
        });
        Ok(())
    }

    pub fn unregister(&self, activity_id: &str) -> bool {
        let key = ActivityId::new(activity_id);
        let removed = {
            let mut windows = self.windows.write();
            let before = windows.len();
            windows.retain(|(id, _)| id != &key);
            windows.len() != before
        };

        if removed {
            info!("Активность {} снята с регистрации", key);
            let _ = self.events.send(RegistryEvent::Unregistered { activity_id: key });
        } else {
            debug!("Снятие с регистрации неизвестной активности {} пропущено", key);
        }
        removed
    }

    pub fn list_running(&self) -> Vec<ActivityId> {
        self.windows.read().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn get_window(&self, activity_id: &str) -> Option<WindowId> {
        self.windows
            .read()
            .iter()
            .find(|(id, _)| id.as_str() == activity_id)
            .map(|(_, window)| *window)
    }

    /// Снимок реестра в виде активностей, в порядке регистрации
    pub fn snapshot(&self) -> Vec<Activity> {
        self.windows
            .read()
            .iter()
            .map(|(id, window)| Activity {
                id: id.clone(),
                window: Some(*window),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let registry = ActivityRegistry::new();
        registry.register(WindowId(10), "org.laptop.Terminal-1").unwrap();
        registry.register(WindowId(11), "org.laptop.Write-2").unwrap();

        assert_eq!(registry.get_window("org.laptop.Write-2"), Some(WindowId(11)));
        assert_eq!(registry.get_window("missing"), None);
        let running: Vec<String> = registry
            .list_running()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(running, vec!["org.laptop.Terminal-1", "org.laptop.Write-2"]);
    }

    #[test]
    fn register_rejects_empty_id() {
        let registry = ActivityRegistry::new();
        assert!(matches!(
            registry.register(WindowId(1), "  "),
            Err(ShellError::InvalidActivity(_))
        ));
        assert!(registry.list_running().is_empty());
    }

    #[test]
    fn reregister_replaces_window() {
        let registry = ActivityRegistry::new();
        registry.register(WindowId(1), "a").unwrap();
        registry.register(WindowId(2), "a").unwrap();
        assert_eq!(registry.snapshot(), vec![Activity::new("a").with_window(WindowId(2))]);
    }

    #[test]
    fn events_are_broadcast() {
        let registry = ActivityRegistry::new();
        let mut rx = registry.subscribe();

        registry.register(WindowId(5), "a").unwrap();
        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));

        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::Registered {
                activity_id: ActivityId::new("a"),
                window: WindowId(5)
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::Unregistered {
                activity_id: ActivityId::new("a")
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
