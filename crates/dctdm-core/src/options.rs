//! Ambient configuration: the knobs spec.md exposes as embed/extract
//! parameters (`δ`, password) collected into a small builder, mirroring the
//! teacher's `CodecOptions`/`ApiHide` builder shape
//! (`stegano-core::media::codec_options`, `stegano-core::api::hide`).

/// The DCTDM coefficient-pair step `δ` and an optional password, shared by
/// both `embed` and `extract` call sites.
#[derive(Clone, Debug)]
pub struct DctdmOptions {
    pub delta: i32,
    pub password: Option<String>,
}

impl Default for DctdmOptions {
    fn default() -> Self {
        DctdmOptions {
            delta: 10,
            password: None,
        }
    }
}

impl DctdmOptions {
    pub fn new(delta: i32) -> Self {
        DctdmOptions {
            delta,
            password: None,
        }
    }

    pub fn with_password<I: Into<String>>(mut self, password: I) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_delta(mut self, delta: i32) -> Self {
        self.delta = delta;
        self
    }
}
