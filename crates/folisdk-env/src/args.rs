use folisdk_core::ArchitectureId;

use crate::error::ActivationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationOptions {
    /// Only adjust `PATH`, the prompt and the active marker.
    pub path_only: bool,
    /// Leave `PS1` alone. Set when the prompt lives in a shell the process
    /// cannot see, e.g. when rendering a script for `eval`.
    pub keep_prompt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRequest {
    pub arch: ArchitectureId,
    pub options: ActivationOptions,
}

impl ActivationRequest {
    pub fn new(arch: &str, options: ActivationOptions) -> Result<Self, ActivationError> {
        Ok(Self {
            arch: parse_arch(arch)?,
            options,
        })
    }
}

/// Parses `activate` arguments. Accepts a bare architecture, `--arch=<a>` or
/// `--arch <a>`, and `--path-only`, in any order. An architecture is required.
pub fn parse_activate_args<I, S>(args: I) -> Result<ActivationRequest, ActivationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut arch: Option<String> = None;
    let mut options = ActivationOptions::default();
    let mut tokens = args.into_iter();

    while let Some(token) = tokens.next() {
        let token = token.as_ref();
        let value = match token {
            "--path-only" => {
                options.path_only = true;
                continue;
            }
            "--arch" => match tokens.next() {
                Some(value) => value.as_ref().to_string(),
                None => {
                    return Err(ActivationError::invalid_argument(
                        "--arch requires a value",
                    ))
                }
            },
            _ => {
                if let Some(value) = token.strip_prefix("--arch=") {
                    value.to_string()
                } else if token.starts_with('-') {
                    return Err(ActivationError::invalid_argument(format!(
                        "unrecognized option '{token}'"
                    )));
                } else {
                    token.to_string()
                }
            }
        };

        if let Some(existing) = &arch {
            return Err(ActivationError::invalid_argument(format!(
                "architecture given twice ('{existing}' and '{value}')"
            )));
        }
        arch = Some(value);
    }

    let Some(arch) = arch else {
        return Err(ActivationError::invalid_argument("no architecture specified"));
    };
    ActivationRequest::new(&arch, options)
}

fn parse_arch(value: &str) -> Result<ArchitectureId, ActivationError> {
    ArchitectureId::parse(value).map_err(|err| ActivationError::invalid_argument(err.to_string()))
}
