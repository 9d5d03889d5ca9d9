/// Whether the current process runs with administrator rights. Gates the
/// kernel-trace provider; always `false` off Windows.
#[cfg(target_os = "windows")]
pub fn is_process_elevated() -> bool {
    use windows_sys::Win32::UI::Shell::IsUserAnAdmin;

    let elevated = unsafe { IsUserAnAdmin() != 0 };
    tracing::debug!(event = "privilege_probe", elevated);
    elevated
}

#[cfg(not(target_os = "windows"))]
pub fn is_process_elevated() -> bool {
    false
}
