use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConnectionExt, EventMask, Window,
};
use x11rb::rust_connection::RustConnection;

use super::{WindowHandle, WindowTargeter};
use crate::error::{RepeatError, Result};

/// EWMH-based targeting for X11 window managers.
pub struct X11Targeter {
    conn: RustConnection,
    root: Window,
}

impl X11Targeter {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| RepeatError::window(format!("cannot connect to X server: {e}")))?;
        let root = conn.setup().roots[screen_num].root;
        Ok(Self { conn, root })
    }

    fn atom(&self, name: &str) -> Result<u32> {
        let reply = self
            .conn
            .intern_atom(false, name.as_bytes())
            .map_err(x11_err)?
            .reply()
            .map_err(x11_err)?;
        Ok(reply.atom)
    }

    fn client_list(&self) -> Result<Vec<Window>> {
        let atom = self.atom("_NET_CLIENT_LIST")?;
        let reply = self
            .conn
            .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, u32::MAX)
            .map_err(x11_err)?
            .reply()
            .map_err(x11_err)?;
        Ok(reply
            .value32()
            .map(|ids| ids.collect())
            .unwrap_or_default())
    }

    fn title(&self, window: Window, net_wm_name: u32) -> Option<String> {
        [net_wm_name, AtomEnum::WM_NAME.into()]
            .into_iter()
            .find_map(|atom| {
                let reply = self
                    .conn
                    .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
                    .ok()?
                    .reply()
                    .ok()?;
                if reply.value.is_empty() {
                    return None;
                }
                Some(String::from_utf8_lossy(&reply.value).into_owned())
            })
    }
}

impl WindowTargeter for X11Targeter {
    fn windows(&self) -> Result<Vec<(u64, String)>> {
        let net_wm_name = self.atom("_NET_WM_NAME")?;
        Ok(self
            .client_list()?
            .into_iter()
            .filter_map(|w| self.title(w, net_wm_name).map(|t| (u64::from(w), t)))
            .collect())
    }

    fn activate(&self, handle: &WindowHandle) -> Result<()> {
        let window = Window::try_from(handle.id())
            .map_err(|_| RepeatError::window(format!("invalid X11 window id {}", handle.id())))?;
        let active = self.atom("_NET_ACTIVE_WINDOW")?;
        // Source indication 2: request comes from a pager.
        let event = ClientMessageEvent::new(
            32,
            window,
            active,
            [2, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(x11_err)?;
        self.conn.flush().map_err(x11_err)?;
        Ok(())
    }
}

fn x11_err(e: impl std::fmt::Display) -> RepeatError {
    RepeatError::window(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires X11 display
    fn test_list_windows() {
        let targeter = X11Targeter::connect().unwrap();
        for (id, title) in targeter.windows().unwrap() {
            println!("{id:#x} {title}");
        }
    }
}
