/// One entry of a call stack as reported by a frame source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub function_name: String,
    pub file_path: String,
    pub line_number: i64,
}

pub const NATIVE_CODE_MARKER: &str = "In native code";
const OMITTED_FRAMES_SUFFIX: &str = " frames omitted";

impl FrameDescriptor {
    pub fn new(
        function_name: impl Into<String>,
        file_path: impl Into<String>,
        line_number: i64,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            file_path: file_path.into(),
            line_number,
        }
    }

    /// Stands in for a live thread which has no introspectable frames,
    /// e.g. one blocked entirely inside native code.
    pub fn native_code_placeholder() -> Self {
        Self::placeholder(NATIVE_CODE_MARKER.to_owned())
    }

    /// Stands in for the frames dropped when a stack exceeds the frame budget.
    pub fn omitted_frames_placeholder(omitted_count: usize) -> Self {
        Self::placeholder(format!("{}{}", omitted_count, OMITTED_FRAMES_SUFFIX))
    }

    fn placeholder(marker: String) -> Self {
        Self {
            function_name: String::new(),
            file_path: marker,
            line_number: 0,
        }
    }

    /// Whether this is one of the frames produced by `native_code_placeholder`
    /// or `omitted_frames_placeholder`.
    pub fn is_placeholder(&self) -> bool {
        if !self.function_name.is_empty() || self.line_number != 0 {
            return false;
        }
        if self.file_path == NATIVE_CODE_MARKER {
            return true;
        }
        self.file_path
            .strip_suffix(OMITTED_FRAMES_SUFFIX)
            .is_some_and(|count| count.parse::<usize>().is_ok())
    }
}
