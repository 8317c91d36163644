use std::ffi::{CStr, CString};
use std::hash::Hash;
use std::os::raw::c_char;
use std::sync::{Mutex, PoisonError};

use lazy_static::lazy_static;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wingetdesk_core::models::{ActionFlags, Column, CoreResult, RowAction};
use wingetdesk_core::{AppSession, CatalogRow, CatalogState, Config};

lazy_static! {
    static ref STATE: Mutex<Option<AppSession>> = Mutex::new(None);
}

#[derive(Serialize)]
struct TableView<'a, R> {
    columns: &'static [Column],
    labels: Vec<&'static str>,
    filter: &'a str,
    rows: Vec<&'a R>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    updates_count: Option<usize>,
}

impl<'a, R> TableView<'a, R>
where
    R: CatalogRow + Clone + Eq + Hash,
{
    fn of(catalog: &'a CatalogState<R>, updates_count: Option<usize>) -> Self {
        Self {
            columns: catalog.columns(),
            labels: catalog.columns().iter().map(|column| column.label()).collect(),
            filter: catalog.filter(),
            rows: catalog.visible().collect(),
            total: catalog.len(),
            updates_count,
        }
    }
}

/// Initialize the wingetdesk session.
///
/// `config_json` may be null, in which case defaults are used.
///
/// # Safety
///
/// `config_json` must be null or a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_init(config_json: *const c_char) -> bool {
    let mut guard = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_some() {
        return true;
    }

    let config = if config_json.is_null() {
        Config::default()
    } else {
        let Some(json) = (unsafe { read_str(config_json) }) else {
            return false;
        };
        match Config::from_json_str(&json) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("Failed to load wingetdesk config: {error}");
                return false;
            }
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .try_init();

    match AppSession::new(&config) {
        Ok(session) => {
            *guard = Some(session);
            tracing::info!(program = %config.program.display(), "wingetdesk session initialized");
            true
        }
        Err(error) => {
            tracing::error!("failed to create session: {error}");
            false
        }
    }
}

/// Reload the main table. Returns the refresh summary as JSON.
#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_refresh(show_all: bool) -> *mut c_char {
    json_result(with_session(|session| Ok(session.refresh(show_all))))
}

#[derive(Serialize)]
struct MenuEntry {
    action: RowAction,
    label: &'static str,
}

/// Context menu entries for `id` in the main table, as JSON.
///
/// # Safety
///
/// `id` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_row_actions(id: *const c_char) -> *mut c_char {
    let Some(id) = (unsafe { read_str(id) }) else {
        return std::ptr::null_mut();
    };
    json_result(with_session(|session| {
        Ok(session
            .right_click_actions(&id)
            .into_iter()
            .map(|action| MenuEntry {
                action,
                label: action.label(),
            })
            .collect::<Vec<_>>())
    }))
}

/// Filter the main table by substring.
///
/// # Safety
///
/// `term` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_search(term: *const c_char) -> bool {
    let Some(term) = (unsafe { read_str(term) }) else {
        return false;
    };
    with_session(|session| {
        session.search(&term);
        Ok(())
    })
    .is_some()
}

/// Sort the main table as a click on `column`'s header would.
///
/// # Safety
///
/// `column` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_sort_clicked(column: *const c_char) -> *mut c_char {
    let Some(column) = (unsafe { read_str(column) }) else {
        return std::ptr::null_mut();
    };
    json_result(with_session(|session| {
        session.sort_clicked(column.parse::<Column>()?)
    }))
}

/// The visible rows of the main table as JSON.
#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_visible_rows() -> *mut c_char {
    with_session(|session| {
        let view = TableView::of(session.catalog(), session.updates_count());
        Ok(to_json_ptr(&view))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Run `winget search` for the install window and return its table as JSON.
///
/// # Safety
///
/// `term` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_search_packages(term: *const c_char) -> *mut c_char {
    let Some(term) = (unsafe { read_str(term) }) else {
        return std::ptr::null_mut();
    };
    with_session(|session| {
        session.search_packages(&term)?;
        Ok(to_json_ptr(&TableView::of(session.search_results(), None)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// The visible rows of the install window's table as JSON.
#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_search_results() -> *mut c_char {
    with_session(|session| Ok(to_json_ptr(&TableView::of(session.search_results(), None))))
        .unwrap_or(std::ptr::null_mut())
}

/// Sort the install window's table by `column`.
///
/// # Safety
///
/// `column` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_sort_search_results(column: *const c_char) -> *mut c_char {
    let Some(column) = (unsafe { read_str(column) }) else {
        return std::ptr::null_mut();
    };
    json_result(with_session(|session| {
        session.sort_search_results(column.parse::<Column>()?)
    }))
}

/// Filter the install window's table by substring.
///
/// # Safety
///
/// `term` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_filter_search_results(term: *const c_char) -> bool {
    let Some(term) = (unsafe { read_str(term) }) else {
        return false;
    };
    with_session(|session| {
        session.filter_search_results(&term);
        Ok(())
    })
    .is_some()
}

/// Available versions of `id` as JSON.
///
/// # Safety
///
/// `id` must be a valid pointer to a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_show_versions(id: *const c_char) -> *mut c_char {
    let Some(id) = (unsafe { read_str(id) }) else {
        return std::ptr::null_mut();
    };
    json_result(with_session(|session| session.show_versions(&id)))
}

/// Run a row action (`update`, `uninstall`, `show_versions` or `install`)
/// on `id` and return its report as JSON.
///
/// # Safety
///
/// `action` and `id` must be valid pointers to NUL-terminated UTF-8 C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_perform_action(
    action: *const c_char,
    id: *const c_char,
) -> *mut c_char {
    let (Some(action), Some(id)) = (unsafe { read_str(action) }, unsafe { read_str(id) }) else {
        return std::ptr::null_mut();
    };
    json_result(with_session(|session| {
        session.perform(action.parse::<RowAction>()?, &id)
    }))
}

/// Install a specific version of `id`.
///
/// # Safety
///
/// `id` and `version` must be valid pointers to NUL-terminated UTF-8 C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_install_version(
    id: *const c_char,
    version: *const c_char,
) -> *mut c_char {
    let (Some(id), Some(version)) = (unsafe { read_str(id) }, unsafe { read_str(version) }) else {
        return std::ptr::null_mut();
    };
    json_result(with_session(|session| {
        session.install_specific_version(&id, &version)
    }))
}

#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_update_all() -> *mut c_char {
    json_result(with_session(|session| Ok(session.update_all())))
}

#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_set_flags(force: bool, accept_agreements: bool) -> bool {
    with_session(|session| {
        session.set_flags(ActionFlags {
            force,
            accept_agreements,
        });
        Ok(())
    })
    .is_some()
}

#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_log_text() -> *mut c_char {
    with_session(|session| Ok(to_c_string(session.log_text())))
        .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_clear_log() -> bool {
    with_session(|session| {
        session.clear_log();
        Ok(())
    })
    .is_some()
}

/// Flip log visibility. Returns the new state, or false without a session.
#[unsafe(no_mangle)]
pub extern "C" fn wingetdesk_toggle_log() -> bool {
    with_session(|session| Ok(session.toggle_log_visible())).unwrap_or(false)
}

/// Free a string previously returned by a `wingetdesk_*` function.
///
/// # Safety
///
/// `s` must be a pointer previously returned by a `wingetdesk_*` function, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wingetdesk_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

fn with_session<T>(operation: impl FnOnce(&mut AppSession) -> CoreResult<T>) -> Option<T> {
    let mut guard = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(session) = guard.as_mut() else {
        tracing::error!("wingetdesk session is not initialized");
        return None;
    };

    match operation(session) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::error!(kind = ?error.kind, "{}", error.message);
            None
        }
    }
}

fn json_result<T: Serialize>(value: Option<T>) -> *mut c_char {
    match value {
        Some(value) => to_json_ptr(&value),
        None => std::ptr::null_mut(),
    }
}

fn to_json_ptr<T: Serialize + ?Sized>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => to_c_string(json),
        Err(error) => {
            tracing::error!("failed to serialize response: {error}");
            std::ptr::null_mut()
        }
    }
}

fn to_c_string(text: String) -> *mut c_char {
    match CString::new(text) {
        Ok(c) => c.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// # Safety
///
/// `ptr` must be null or a valid pointer to a NUL-terminated C string.
unsafe fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    c_str.to_str().ok().map(str::to_owned)
}
