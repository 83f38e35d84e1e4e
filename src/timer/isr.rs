use crate::session::{ControlEdge, TickDriven};
use crate::timer::Node;
use core::cell::RefCell;
use critical_section::Mutex;

/// Used to initialize a global static [`Node`] for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use core::cell::RefCell;
/// use critical_section::Mutex;
/// use lightlink::receive::Receiver;
/// use lightlink::timer::{Node, global_node_init};
/// use some_hal::PD2;
///
/// static LINK_NODE: Mutex<RefCell<Option<Node<Receiver<PD2, 64>>>>> = global_node_init();
/// ```
pub const fn global_node_init<S: TickDriven>() -> Mutex<RefCell<Option<Node<S>>>> {
    Mutex::new(RefCell::new(None))
}

/// Installs `session` in the global node, replacing (and dropping) any
/// previous one. The clock restarts at zero.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let receiver = Receiver::new(rx, ReceiverConfig::default()).unwrap();
///     global_node_setup(&LINK_NODE, receiver);
/// }
/// ```
pub fn global_node_setup<S: TickDriven>(
    global_node: &'static Mutex<RefCell<Option<Node<S>>>>,
    session: S,
) {
    critical_section::with(|cs| {
        let _ = global_node.borrow(cs).replace(Some(Node::new(session)));
    });
}

/// Runs the tick at each timer interrupt.
///
/// Does nothing until [`global_node_setup`] has been called.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER0() {
///     global_node_tick(&LINK_NODE);
/// }
/// ```
pub fn global_node_tick<S: TickDriven>(global_node: &'static Mutex<RefCell<Option<Node<S>>>>) {
    critical_section::with(|cs| {
        if let Some(node) = global_node.borrow(cs).borrow_mut().as_mut() {
            node.tick();
        }
    });
}

/// Forwards a control-line edge from the pin-change interrupt.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn EINT3() {
///     let edge = if rising { ControlEdge::Rising } else { ControlEdge::Falling };
///     global_node_control(&LINK_NODE, edge);
/// }
/// ```
pub fn global_node_control<S: TickDriven>(
    global_node: &'static Mutex<RefCell<Option<Node<S>>>>,
    edge: ControlEdge,
) {
    critical_section::with(|cs| {
        if let Some(node) = global_node.borrow(cs).borrow_mut().as_mut() {
            node.control(edge);
        }
    });
}

/// Runs `f` against the global node's session from outside interrupt
/// context, e.g. to arm a transmission or collect a received frame.
///
/// Returns `None` if the node has not been set up.
pub fn global_node_with<S: TickDriven, R>(
    global_node: &'static Mutex<RefCell<Option<Node<S>>>>,
    f: impl FnOnce(&mut S) -> R,
) -> Option<R> {
    critical_section::with(|cs| {
        global_node
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .map(|node| f(node.session_mut()))
    })
}

/// Removes the node from the global, leaving it empty.
pub fn global_node_take<S: TickDriven>(
    global_node: &'static Mutex<RefCell<Option<Node<S>>>>,
) -> Option<Node<S>> {
    critical_section::with(|cs| global_node.borrow(cs).take())
}
