//! POSIX shell quoting for the remote command line.

use super::executor::ProvisioningParams;

/// Wrap `value` in single quotes so a POSIX shell reads it literally.
///
/// Each embedded `'` becomes `'\''` (close quote, escaped quote, reopen).
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Build the command string executed by the remote shell:
/// `<script> -c '<client>' -p '<pg>' -s '<key>' -i '<init>'`.
///
/// The script path comes from operator configuration and is left unquoted so
/// `~` and variables still expand remotely.
pub fn remote_command(script_path: &str, params: &ProvisioningParams) -> String {
    let mut command = script_path.to_string();
    for (flag, value) in params.flag_pairs() {
        command.push(' ');
        command.push_str(flag);
        command.push(' ');
        command.push_str(&quote(value));
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::test_helpers::sample_params;

    #[test]
    fn plain_value_is_wrapped() {
        assert_eq!(quote("dupont-sarl"), "'dupont-sarl'");
    }

    #[test]
    fn embedded_quote_is_closed_escaped_and_reopened() {
        assert_eq!(quote("o'brien"), r"'o'\''brien'");
    }

    #[test]
    fn empty_value_is_an_empty_quoted_word() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn metacharacters_stay_inside_quotes() {
        assert_eq!(quote("$(rm -rf /); `id`"), "'$(rm -rf /); `id`'");
    }

    #[test]
    fn remote_command_quotes_every_value() {
        let command = remote_command("/opt/erpbtp/create-client-stack.sh", &sample_params());
        assert_eq!(
            command,
            r"/opt/erpbtp/create-client-stack.sh -c 'o'\''brien' -p 'pg$ecret!' -s 'abcDEF123' -i 'init&pass'"
        );
    }

    #[tokio::test]
    async fn quoted_value_round_trips_through_sh() {
        let tricky = "it's $HOME; `echo no` \"x\" \\ end";
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(format!("printf '%s' {}", quote(tricky)))
            .output()
            .await
            .expect("run sh");
        assert_eq!(String::from_utf8_lossy(&output.stdout), tricky);
    }
}
