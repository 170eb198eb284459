//! `SendInput` / `keybd_event` backend.

use std::mem;

use tracing::trace;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_EXTENDEDKEY,
    KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, KEYEVENTF_UNICODE, MAPVK_VK_TO_VSC, MapVirtualKeyW,
    SendInput, VIRTUAL_KEY, VkKeyScanW, keybd_event,
};

use crate::{Error, Injector, Result, vk};

/// `VkKeyScanW` shift-state bits.
const SHIFT_STATE_SHIFT: u8 = 0x01;
/// Control bit.
const SHIFT_STATE_CTRL: u8 = 0x02;
/// Alt bit.
const SHIFT_STATE_ALT: u8 = 0x04;

/// Injector posting through `SendInput`, with `keybd_event` as the legacy
/// path.
pub(crate) struct SendInputInjector;

/// Build one keyboard `INPUT` record.
fn keyboard(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Submit a batch and return how many events the OS injected.
fn send(inputs: &[INPUT]) -> usize {
    // SAFETY: `inputs` is a valid slice of initialized keyboard records and
    // the size argument matches the element type.
    let sent = unsafe { SendInput(inputs, mem::size_of::<INPUT>() as i32) };
    sent as usize
}

/// Submit a batch that must be fully accepted.
fn send_all(inputs: &[INPUT]) -> Result<()> {
    let sent = send(inputs);
    if sent == inputs.len() {
        Ok(())
    } else {
        Err(Error::Rejected {
            expected: inputs.len(),
            sent,
        })
    }
}

/// Direction flag.
fn up_flag(key_up: bool) -> KEYBD_EVENT_FLAGS {
    if key_up {
        KEYEVENTF_KEYUP
    } else {
        KEYBD_EVENT_FLAGS(0)
    }
}

/// Legacy key event via `keybd_event`. The call reports nothing back.
fn legacy_event(vk: u8, key_up: bool) {
    // SAFETY: plain value arguments; no pointers involved.
    unsafe { keybd_event(vk, 0, up_flag(key_up), 0) };
}

impl Injector for SendInputInjector {
    fn key_scan(&self, code: u16, key_up: bool, extended: bool) -> Result<()> {
        let mut flags = KEYEVENTF_SCANCODE | up_flag(key_up);
        if extended {
            flags = flags | KEYEVENTF_EXTENDEDKEY;
        }
        send_all(&[keyboard(0, code, flags)])
    }

    fn key_virtual(&self, vk: u16, key_up: bool) -> Result<()> {
        // SAFETY: plain value arguments.
        let scan = unsafe { MapVirtualKeyW(u32::from(vk), MAPVK_VK_TO_VSC) } as u16;
        send_all(&[keyboard(vk, scan, up_flag(key_up))])
    }

    fn unicode_units(&self, units: &[u16]) -> Result<usize> {
        let inputs: Vec<INPUT> = units
            .iter()
            .flat_map(|&unit| {
                [
                    keyboard(0, unit, KEYEVENTF_UNICODE),
                    keyboard(0, unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
                ]
            })
            .collect();
        let sent = send(&inputs);
        trace!(expected = inputs.len(), sent, "unicode_batch");
        Ok(sent)
    }

    fn legacy_text(&self, text: &str) -> Result<()> {
        // Map everything first so an unmappable character sends nothing.
        let mut strokes = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let stroke = match ch {
                '\n' | '\r' => (vk::RETURN as u8, 0),
                '\t' => (vk::TAB as u8, 0),
                _ => {
                    let unit = u16::try_from(u32::from(ch)).map_err(|_| Error::Unmappable(ch))?;
                    // SAFETY: plain value argument.
                    let packed = unsafe { VkKeyScanW(unit) };
                    if packed == -1 {
                        return Err(Error::Unmappable(ch));
                    }
                    let [key, state] = packed.to_le_bytes();
                    (key, state)
                }
            };
            strokes.push(stroke);
        }
        for (key, state) in strokes {
            let mods: Vec<u8> = [
                (SHIFT_STATE_SHIFT, vk::SHIFT),
                (SHIFT_STATE_CTRL, vk::CONTROL),
                (SHIFT_STATE_ALT, vk::MENU),
            ]
            .into_iter()
            .filter(|(bit, _)| state & bit != 0)
            .map(|(_, m)| m as u8)
            .collect();
            for &m in &mods {
                legacy_event(m, false);
            }
            legacy_event(key, false);
            legacy_event(key, true);
            for &m in mods.iter().rev() {
                legacy_event(m, true);
            }
        }
        Ok(())
    }

    fn legacy_key(&self, vk: u16) -> Result<()> {
        let key = u8::try_from(vk).map_err(|_| Error::Rejected {
            expected: 2,
            sent: 0,
        })?;
        legacy_event(key, false);
        legacy_event(key, true);
        Ok(())
    }
}
