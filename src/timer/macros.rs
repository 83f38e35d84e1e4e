/// Declares a static global `LINK_NODE` instance protected by a
/// `critical_section` mutex.
///
/// This macro creates a `static` singleton `LINK_NODE` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the shared session state.
///
/// # Arguments
/// - `$session`: the concrete session type, e.g. `Transmitter<PB5, 32>`,
///   `Receiver<PD2, 64>` or `Link<PB5, PD2>`
///
/// # Example
/// ```rust,ignore
/// init_link_node!(lightlink::receive::Receiver<MyRxPinType, 64>);
/// ```
#[macro_export]
macro_rules! init_link_node {
    ( $session:ty ) => {
        pub static LINK_NODE: $crate::critical_section::Mutex<
            core::cell::RefCell<Option<$crate::timer::Node<$session>>>,
        > = $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Installs a session in the global `LINK_NODE` singleton.
///
/// # Arguments
/// - `$session`: an already constructed transmitter, receiver or link
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let receiver = Receiver::new(rx, ReceiverConfig::default()).unwrap();
///     setup_link_node!(receiver);
/// }
/// ```
///
/// # Notes
/// - Safe to call from `main()`; takes its own critical section.
/// - Requires `init_link_node!` to have been used earlier.
#[macro_export]
macro_rules! setup_link_node {
    ( $session:expr ) => {
        $crate::critical_section::with(|cs| {
            let _ = LINK_NODE
                .borrow(cs)
                .replace(Some($crate::timer::Node::new($session)));
        })
    };
}

/// Runs one tick of the global `LINK_NODE`.
///
/// Place this inside your timer interrupt handler.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER0_COMPA() {
///     tick_link_node!();
/// }
/// ```
#[macro_export]
macro_rules! tick_link_node {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(node) = LINK_NODE.borrow(cs).borrow_mut().as_mut() {
                node.tick();
            }
        })
    };
}

/// Forwards a control-line edge to the global `LINK_NODE`.
///
/// Place this inside the pin-change interrupt of the control line.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn INT0() {
///     control_link_node!(lightlink::session::ControlEdge::Rising);
/// }
/// ```
#[macro_export]
macro_rules! control_link_node {
    ( $edge:expr ) => {
        $crate::critical_section::with(|cs| {
            if let Some(node) = LINK_NODE.borrow(cs).borrow_mut().as_mut() {
                node.control($edge);
            }
        })
    };
}
