//! Application-wide constants and default values
//!
//! Canvas geometry lives here so the graph model, hit-testing and drawing agree

/// Default window size for the editor surface
pub const DEFAULT_WINDOW_SIZE: [f32; 2] = [1280.0, 720.0];

/// Node geometry constants
pub mod node {
    /// Width of every node body
    pub const WIDTH: f32 = 120.0;

    /// Height of every node body
    pub const HEIGHT: f32 = 80.0;

    /// Height of the colored header band
    pub const HEADER_HEIGHT: f32 = 20.0;

    /// Vertical offset of the first socket from the node origin
    pub const SOCKET_START_Y: f32 = 30.0;

    /// Vertical spacing between consecutive sockets
    pub const SOCKET_SPACING: f32 = 20.0;

    /// First id handed out by a graph
    pub const FIRST_ID: usize = 1;
}

/// Socket picking and drawing constants
pub mod socket {
    /// Radius used to start a connection drag from a socket
    pub const DETECT_RADIUS: f32 = 10.0;

    /// Radius used to accept a socket when a connection drag is released.
    /// Must stay larger than `DETECT_RADIUS`.
    pub const CONNECT_RADIUS: f32 = 15.0;

    /// Drawn radius of a socket anchor
    pub const DRAW_RADIUS: f32 = 5.0;
}

/// Canvas drawing constants
pub mod canvas {
    /// Spacing of the background grid
    pub const GRID_SPACING: f32 = 40.0;

    /// Horizontal offset of connection curve control points
    pub const CURVE_CONTROL_OFFSET: f32 = 50.0;

    /// Stroke width of connection curves and the drag line
    pub const WIRE_WIDTH: f32 = 2.0;
}

/// Evaluation constants
pub mod eval {
    /// Value of a manual input node whose `val` parameter was never set
    pub const DEFAULT_CONSTANT: f32 = 0.5;

    /// Parameter key holding a manual input node's constant
    pub const CONSTANT_PARAM: &str = "val";
}
