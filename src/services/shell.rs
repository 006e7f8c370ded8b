//! Shell loop: the single task that owns the tabbing session.
//!
//! Key chords, commit timers and active window changes all arrive on one
//! channel; registry events arrive on a broadcast subscription and are
//! mirrored into the home model.

use crate::backend::WindowBackend;
use crate::error::Result;
use crate::events::{ShellEvent, WindowId};
use crate::model::{Activity, ActivityRegistry, HomeModel, RegistryEvent, ShellModel, ZoomLevel};
use crate::services::tabbing::TabbingHandler;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

pub struct ShellService {
    handler: TabbingHandler,
    model: Arc<HomeModel>,
    registry: Arc<ActivityRegistry>,
    backend: Arc<dyn WindowBackend>,
    events: mpsc::UnboundedReceiver<ShellEvent>,
    registry_events: broadcast::Receiver<RegistryEvent>,
}

impl ShellService {
    pub fn new(
        handler: TabbingHandler,
        model: Arc<HomeModel>,
        registry: Arc<ActivityRegistry>,
        backend: Arc<dyn WindowBackend>,
        events: mpsc::UnboundedReceiver<ShellEvent>,
    ) -> Self {
        let registry_events = registry.subscribe();
        // Активности, зарегистрированные до подписки
        model.replace_activities(registry.snapshot());

        Self {
            handler,
            model,
            registry,
            backend,
            events,
            registry_events,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Цикл оболочки запущен");

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(ShellEvent::Shutdown) | None => break,
                    Some(event) => self.dispatch(event),
                },
                registry_event = self.registry_events.recv() => match registry_event {
                    Ok(event) => self.apply_registry_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Пропущено {} событий реестра, пересинхронизация", skipped);
                        self.model.replace_activities(self.registry.snapshot());
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Канал событий реестра закрыт");
                    }
                },
            }
        }

        // Отпускание модификатора могло не дойти: не оставляем рамку видимой
        if self.handler.is_tabbing() {
            self.handler.stop(0);
        }
        info!("Цикл оболочки завершён");
        Ok(())
    }

    pub fn dispatch(&mut self, event: ShellEvent) {
        debug!("Событие оболочки: {:?} (время: {:?})", event, event.event_time());

        match event {
            ShellEvent::NextActivity { event_time } => self.handler.next_activity(event_time),
            ShellEvent::PreviousActivity { event_time } => self.handler.previous_activity(event_time),
            ShellEvent::ModifierReleased { event_time } => {
                if self.handler.is_tabbing() {
                    self.handler.stop(event_time);
                }
            }
            ShellEvent::CommitDue { timer, event_time } => {
                self.handler.on_commit_due(timer, event_time)
            }
            ShellEvent::ActiveWindowChanged { window } => self.track_active_window(window),
            // Обрабатывается в run()
            ShellEvent::Shutdown => {}
        }
    }

    fn apply_registry_event(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Registered { activity_id, window } => {
                self.model.add_activity(Activity {
                    id: activity_id,
                    window: Some(window),
                });
            }
            RegistryEvent::Unregistered { activity_id } => {
                self.model.remove_activity(&activity_id);
            }
        }
        debug!("Запущено активностей: {}", self.model.activities().len());
    }

    /// Если активное окно не принадлежит активности (диалог, рамка),
    /// активной считается верхняя по стеку активность. Пока активна какая-то
    /// активность, оболочка находится в масштабе одной активности.
    fn track_active_window(&mut self, window: Option<WindowId>) {
        let in_activity = self.model.set_active_window(window) || {
            let fallback = self
                .backend
                .windows_stacked()
                .into_iter()
                .rev()
                .find(|w| self.model.set_active_window(Some(*w)));
            debug!("Окно {:?} не принадлежит активности, выбрано по стеку: {:?}", window, fallback);
            fallback.is_some()
        };

        let zoom_level = if in_activity { ZoomLevel::Activity } else { ZoomLevel::Home };
        if self.model.zoom_level() != zoom_level {
            debug!("Масштаб оболочки: {:?}", zoom_level);
            self.model.set_zoom_level(zoom_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ModifierKey, Modifiers};
    use crate::model::ActivityId;
    use crate::services::frame::SwitcherFrame;
    use crate::services::tabbing::tests::RecordingBackend;
    use crate::services::timer::TokioTimer;
    use tokio::time::{sleep, Duration};

    struct Harness {
        tx: mpsc::UnboundedSender<ShellEvent>,
        registry: Arc<ActivityRegistry>,
        model: Arc<HomeModel>,
        backend: Arc<RecordingBackend>,
        task: tokio::task::JoinHandle<Result<()>>,
    }

    fn spawn_shell(mask: Modifiers) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Arc::new(ActivityRegistry::new());
        registry.register(WindowId(100), "a").unwrap();
        registry.register(WindowId(101), "b").unwrap();
        registry.register(WindowId(102), "c").unwrap();

        let model = Arc::new(HomeModel::new());
        let backend = Arc::new(RecordingBackend::new(mask));
        let handler = TabbingHandler::new(
            Arc::new(SwitcherFrame::new(backend.clone())),
            model.clone(),
            backend.clone(),
            Box::new(TokioTimer::new(tx.clone())),
            ModifierKey::Alt,
        );
        let service = ShellService::new(handler, model.clone(), registry.clone(), backend.clone(), rx);
        let task = tokio::spawn(service.run());

        Harness { tx, registry, model, backend, task }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_repeats_commits_once() {
        let h = spawn_shell(Modifiers::new().with(ModifierKey::Alt));
        h.model.set_active_activity(Some(&ActivityId::new("a")));

        for t in 1..=5 {
            h.tx.send(ShellEvent::NextActivity { event_time: t }).unwrap();
            sleep(Duration::from_millis(100)).await;
        }
        assert!(h.backend.activations().is_empty());

        sleep(Duration::from_millis(300)).await;
        // a (подтверждение) -> b -> c -> a -> b
        assert_eq!(h.backend.activations(), vec![(WindowId(101), 5)]);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(h.backend.activations().len(), 1);
        assert_eq!(h.model.tabbing_activity().unwrap().id.as_str(), "b");

        h.tx.send(ShellEvent::ModifierReleased { event_time: 9 }).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(h.backend.activations(), vec![(WindowId(101), 5), (WindowId(101), 9)]);
        assert!(h.model.tabbing_activity().is_none());

        h.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn quick_release_commits_without_waiting() {
        let h = spawn_shell(Modifiers::new().with(ModifierKey::Alt));
        h.model.set_active_activity(Some(&ActivityId::new("a")));

        h.tx.send(ShellEvent::NextActivity { event_time: 1 }).unwrap();
        h.tx.send(ShellEvent::NextActivity { event_time: 2 }).unwrap();
        h.tx.send(ShellEvent::ModifierReleased { event_time: 3 }).unwrap();
        sleep(Duration::from_millis(1000)).await;

        assert_eq!(h.backend.activations(), vec![(WindowId(101), 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_commits_open_session() {
        let h = spawn_shell(Modifiers::new().with(ModifierKey::Alt));
        h.model.set_active_activity(Some(&ActivityId::new("a")));

        h.tx.send(ShellEvent::NextActivity { event_time: 1 }).unwrap();
        h.tx.send(ShellEvent::NextActivity { event_time: 2 }).unwrap();
        h.tx.send(ShellEvent::Shutdown).unwrap();

        h.task.await.unwrap().unwrap();
        assert_eq!(h.backend.activations(), vec![(WindowId(101), 0)]);
        assert_eq!(h.backend.log.lock().hidden, 1);
        assert!(h.model.tabbing_activity().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn registry_changes_reach_the_model() {
        let h = spawn_shell(Modifiers::new());
        sleep(Duration::from_millis(10)).await;
        assert_eq!(h.model.activities().len(), 3);

        h.registry.register(WindowId(103), "d").unwrap();
        h.registry.unregister("a");
        sleep(Duration::from_millis(10)).await;

        let ids: Vec<String> = h.model.activities().iter().map(|a| a.id.to_string()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn active_window_changes_update_model() {
        let h = spawn_shell(Modifiers::new());
        h.tx.send(ShellEvent::ActiveWindowChanged { window: Some(WindowId(102)) }).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(h.model.active_activity().unwrap().id.as_str(), "c");

        assert_eq!(h.model.zoom_level(), ZoomLevel::Activity);

        h.tx.send(ShellEvent::ActiveWindowChanged { window: None }).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(h.model.active_activity().is_none());
        assert_eq!(h.model.zoom_level(), ZoomLevel::Home);
    }

    #[tokio::test(start_paused = true)]
    async fn single_tap_inside_activity_switches_to_next() {
        let h = spawn_shell(Modifiers::new().with(ModifierKey::Alt));
        h.tx.send(ShellEvent::ActiveWindowChanged { window: Some(WindowId(100)) }).unwrap();
        h.tx.send(ShellEvent::NextActivity { event_time: 1 }).unwrap();
        h.tx.send(ShellEvent::ModifierReleased { event_time: 2 }).unwrap();
        sleep(Duration::from_millis(1000)).await;

        assert_eq!(h.model.active_activity().unwrap().id.as_str(), "a");
        assert_eq!(h.backend.activations(), vec![(WindowId(101), 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn dialog_window_keeps_activity_zoom() {
        let h = spawn_shell(Modifiers::new());
        h.backend.stacked.lock().extend([WindowId(101), WindowId(100), WindowId(7)]);

        // 7 - диалог поверх активности a
        h.tx.send(ShellEvent::ActiveWindowChanged { window: Some(WindowId(7)) }).unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(h.model.active_activity().unwrap().id.as_str(), "a");
        assert_eq!(h.model.zoom_level(), ZoomLevel::Activity);
    }
}
