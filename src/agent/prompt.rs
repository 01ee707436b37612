//! System prompt construction.
//!
//! The base prompt describes the virtual machine the tools operate in;
//! callers append a task-specific suffix through the loop configuration.

/// Capability description shown to the model on every call. Tuned for the
/// containerized Ubuntu desktop the standard tool set controls.
const SYSTEM_PROMPT_TEMPLATE: &str = "\
<SYSTEM_CAPABILITY>
* You are utilising an Ubuntu virtual machine using {arch} architecture with internet access.
* You can install Ubuntu applications with your bash tool. Use curl instead of wget.
* To open firefox, please just click on the firefox icon. Note, firefox-esr is what is installed on your system.
* Using the bash tool you can start GUI applications, but you need to set export DISPLAY=:1 and use a subshell, e.g. \"(DISPLAY=:1 xterm &)\". GUI apps may take some time to appear; take a screenshot to confirm.
* When a command is expected to output a very large quantity of text, redirect into a tmp file and inspect it with str_replace_editor or grep.
* When viewing a page it can be helpful to zoom out so that you can see everything, or scroll down before deciding something isn't available.
* Computer function calls take a while to run and return; where feasible, chain multiple calls into one request.
* The current date is {date}.
</SYSTEM_CAPABILITY>

<IMPORTANT>
* When using Firefox, if a startup wizard appears, IGNORE IT. Click the address bar directly and enter the search term or URL there.
* For PDFs: rather than paging through screenshots, determine the URL, download with curl, convert with pdftotext and read the text file with str_replace_editor.
</IMPORTANT>";

/// Build the system prompt, with an optional caller-supplied suffix.
pub fn build_system_prompt(suffix: &str) -> String {
    let base = SYSTEM_PROMPT_TEMPLATE
        .replace("{arch}", std::env::consts::ARCH)
        .replace("{date}", &chrono::Local::now().format("%A, %B %-d, %Y").to_string());

    if suffix.is_empty() {
        base
    } else {
        format!("{base} {suffix}")
    }
}
