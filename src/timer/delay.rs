use crate::session::TickDriven;
use crate::timer::Node;
use embedded_hal::delay::DelayNs;

/// Runs a blocking loop that repeatedly calls `tick()` on the provided node.
///
/// This is a simple timing loop for use in environments where interrupts are
/// unavailable or undesired. The tick period is `tick_us` plus however long
/// the session's own tick takes, so the effective bit rate drifts a little
/// low. The receiver measures the period, so this only matters when the other
/// end expects an exact rate.
///
/// # Arguments
/// - `node`: the node driving a transmitter, receiver or link
/// - `delay`: a delay provider implementing `DelayNs`, typically from the HAL
/// - `tick_us`: the delay between each tick call, in microseconds
///
/// # Example
/// ```rust,ignore
/// use lightlink::timer::{Node, run_tick_loop};
/// let mut node = Node::new(transmitter);
/// run_tick_loop(&mut node, &mut delay, 62);
/// ```
///
/// # Notes
/// - This loop never returns; it is intended for single-purpose firmware.
/// - For anything else, prefer interrupt-driven tick scheduling.
pub fn run_tick_loop<D: DelayNs, S: TickDriven>(
    node: &mut Node<S>,
    delay: &mut D,
    tick_us: u32,
) -> ! {
    loop {
        node.tick();
        delay.delay_us(tick_us);
    }
}

/// Like [`run_tick_loop`], but returns once `done` holds for the session,
/// giving back the number of ticks run.
///
/// # Example
/// ```rust,ignore
/// use lightlink::timer::{Node, run_ticks_until};
/// let mut node = Node::new(receiver);
/// let _ = run_ticks_until(&mut node, &mut delay, 62, |rx| rx.received().is_some());
/// let frame = node.session().received();
/// ```
pub fn run_ticks_until<D: DelayNs, S: TickDriven>(
    node: &mut Node<S>,
    delay: &mut D,
    tick_us: u32,
    mut done: impl FnMut(&S) -> bool,
) -> u32 {
    let mut ticks = 0u32;
    while !done(node.session()) {
        node.tick();
        delay.delay_us(tick_us);
        ticks = ticks.wrapping_add(1);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReceiverConfig, TransmitterConfig};
    use crate::link::Link;
    use crate::receive::Receiver;
    use crate::test_support::Wire;
    use crate::transmit::Transmitter;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_run_ticks_until_transmitter_done() {
        let wire = Wire::default();
        let mut transmitter: Transmitter<Wire, 4> =
            Transmitter::new(wire.clone(), TransmitterConfig::default()).unwrap();
        transmitter.init_send(&[0xa5]).unwrap();
        let mut node = Node::new(transmitter);

        let ticks = run_ticks_until(&mut node, &mut NoopDelay::new(), 62, |tx| tx.is_done());
        // Preamble, sync, eight data bits and the closing low bit.
        assert_eq!(ticks, 8 + 8 + 8 + 1);
        assert!(!wire.level());
    }

    #[test]
    fn test_run_ticks_until_link_receives() {
        let wire = Wire::default();
        let config = TransmitterConfig {
            ticks_per_bit: 5,
            ..Default::default()
        };
        let transmitter: Transmitter<Wire, 8> = Transmitter::new(wire.clone(), config).unwrap();
        let receiver: Receiver<Wire, 8> = Receiver::new(wire, ReceiverConfig::default()).unwrap();
        let mut node = Node::new(Link::new(transmitter, receiver));
        node.session_mut().send(b"hi").unwrap();

        let _ = run_ticks_until(&mut node, &mut NoopDelay::new(), 62, |link| {
            link.receiver.received().is_some()
        });
        assert_eq!(node.session().read(), Ok(&b"hi"[..]));
    }
}
