//! Language engine selected by the listener's port

/// Language context a listener reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Cpp,
    Rust,
}

impl Engine {
    /// Rust iff `port` is the Rust port, C++ otherwise
    pub fn for_port(port: u16, rust_port: u16) -> Self {
        if port == rust_port {
            Engine::Rust
        } else {
            Engine::Cpp
        }
    }

    /// Label used in the `engine` field of reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Cpp => "cpp-native",
            Engine::Rust => "rust-native",
        }
    }

    /// Language context shown in the startup banner
    pub fn context(&self) -> &'static str {
        match self {
            Engine::Cpp => "CPP (Native)",
            Engine::Rust => "RUST (Native)",
        }
    }

    /// Canned build output reported as `stdout`
    pub fn canned_output(&self, port: u16) -> String {
        match self {
            Engine::Rust => format!(
                "Finished release [optimized] target(s) in 0.1s\nOutput: Rust binary executed successfully on port {}.",
                port
            ),
            Engine::Cpp => format!(
                "Build: g++ -O3 aura_vfs_optimized\nOutput: C++ execution completed on port {}.",
                port
            ),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
