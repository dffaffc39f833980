//! Windows system tray implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info, warn};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem},
    TrayIcon, TrayIconBuilder,
};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::WindowId;

use super::{autostart_label, icon};
use crate::autostart::{self, Autostart, PlatformStore};
use crate::bridge::{BridgeHandle, BridgeStatus, EventBridge};
use crate::config::Config;

/// Menu item IDs
mod menu_ids {
    pub const STATUS: &str = "status";
    pub const AUTOSTART: &str = "autostart";
    pub const QUIT: &str = "quit";
}

/// Events delivered to the tray event loop from other threads.
#[derive(Debug)]
enum UserEvent {
    Menu(MenuEvent),
    Status(BridgeStatus),
}

/// Application state for the tray icon
struct TrayApp {
    tray_icon: Option<TrayIcon>,
    menu: Menu,
    status_item: MenuItem,
    autostart_item: MenuItem,
    autostart: Option<Autostart<PlatformStore>>,
    bridge: BridgeHandle,
}

impl TrayApp {
    fn new(bridge: BridgeHandle) -> Result<Self> {
        let autostart = match autostart::system() {
            Ok(manager) => Some(manager),
            Err(e) => {
                warn!(error = %e, "Autostart unavailable");
                None
            }
        };

        let menu = Menu::new();

        // Status item (disabled, just shows info)
        let status_item = MenuItem::with_id(
            menu_ids::STATUS,
            bridge.current().to_string(),
            false,
            None,
        );
        menu.append(&status_item)?;

        menu.append(&PredefinedMenuItem::separator())?;

        let autostart_item = match &autostart {
            Some(manager) => MenuItem::with_id(
                menu_ids::AUTOSTART,
                autostart_label(manager.is_enabled()),
                true,
                None,
            ),
            None => MenuItem::with_id(menu_ids::AUTOSTART, "Autostart unavailable", false, None),
        };
        menu.append(&autostart_item)?;

        menu.append(&PredefinedMenuItem::separator())?;

        let quit_item = MenuItem::with_id(menu_ids::QUIT, "Quit", true, None);
        menu.append(&quit_item)?;

        Ok(Self {
            tray_icon: None,
            menu,
            status_item,
            autostart_item,
            autostart,
            bridge,
        })
    }

    fn create_icon(&self) -> Result<tray_icon::Icon> {
        let rgba = icon::render();
        let (width, height) = rgba.dimensions();

        tray_icon::Icon::from_rgba(rgba.into_raw(), width, height)
            .map_err(|e| anyhow::anyhow!("Failed to create icon: {}", e))
    }

    fn toggle_autostart(&self) {
        let Some(manager) = &self.autostart else {
            return;
        };

        if let Err(e) = manager.toggle() {
            error!(error = %e, "Failed to toggle autostart");
        }

        // Re-read rather than trusting the toggle result
        self.autostart_item
            .set_text(autostart_label(manager.is_enabled()));
    }

    fn show_status(&self, status: &BridgeStatus) {
        let text = status.to_string();
        self.status_item.set_text(&text);

        if let Some(tray_icon) = &self.tray_icon {
            if let Err(e) = tray_icon.set_tooltip(Some(format!("Autotile - {}", text))) {
                warn!(error = %e, "Failed to update tray tooltip");
            }
        }
    }
}

impl ApplicationHandler<UserEvent> for TrayApp {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Create tray icon on first resume
        if self.tray_icon.is_some() {
            return;
        }

        let icon = match self.create_icon() {
            Ok(i) => i,
            Err(e) => {
                error!(error = %e, "Failed to create icon");
                return;
            }
        };

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(self.menu.clone()))
            .with_tooltip(format!("Autotile - {}", self.bridge.current()))
            .with_icon(icon)
            .build();

        match tray_icon {
            Ok(ti) => {
                self.tray_icon = Some(ti);
                info!("System tray icon created");
            }
            Err(e) => {
                error!(error = %e, "Failed to create tray icon");
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // We don't have any windows, just the tray icon
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Status(status) => self.show_status(&status),
            UserEvent::Menu(event) => match event.id.0.as_str() {
                menu_ids::AUTOSTART => self.toggle_autostart(),
                menu_ids::QUIT => {
                    info!("Quit requested from tray");
                    self.bridge.stop();
                    event_loop.exit();
                }
                _ => {}
            },
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.bridge.stop();
        self.tray_icon = None;
    }
}

/// Forward bridge status changes into the event loop.
async fn forward_status(bridge: BridgeHandle, proxy: EventLoopProxy<UserEvent>) {
    let mut status_rx = bridge.status();
    while status_rx.changed().await.is_ok() {
        let status = status_rx.borrow_and_update().clone();
        if proxy.send_event(UserEvent::Status(status)).is_err() {
            // Event loop is gone
            break;
        }
    }
}

/// Run the system tray application
pub async fn run_tray(config: Config) -> Result<()> {
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;

    let menu_proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event| {
        let _ = menu_proxy.send_event(UserEvent::Menu(event));
    }));

    let (bridge, handle) = EventBridge::new(config.bridge.clone());
    let bridge_task = tokio::spawn(bridge.run());
    let forward_task = tokio::spawn(forward_status(handle.clone(), event_loop.create_proxy()));
    let status_task = tokio::spawn(crate::cli::run::watch_status(
        handle.status(),
        config.tray.notifications,
    ));

    let mut app = TrayApp::new(handle.clone())?;
    event_loop.run_app(&mut app)?;

    // The bridge closes its socket before returning
    handle.stop();
    match tokio::time::timeout(Duration::from_secs(2), bridge_task).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => error!(error = %e, "Bridge task panicked"),
        Err(_) => warn!("Bridge did not stop in time"),
    }
    forward_task.abort();
    status_task.abort();

    MenuEvent::set_event_handler(None::<fn(MenuEvent)>);
    info!("Tray exited");
    Ok(())
}
