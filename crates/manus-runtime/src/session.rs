//! Per-hand and whole-pipeline session state.
//!
//! A [`HandSession`] owns the skeleton of one hand together with the most
//! recent sample and gesture.  A [`GloveSession`] owns the transport, the
//! retargeter, every registered hand and the interaction trigger, and drives
//! them once per frame through [`GloveSession::tick`].

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use manus_hal::DeviceTransport;
use manus_perception::math::{Ray, Vec3};
use manus_perception::skeleton::{BoneHierarchy, BoneId, bone_name, lookup_bone, lookup_fingertip};
use manus_perception::{Retargeter, TrackingMode, classify, vector_to_local};
use manus_types::{
    CalibrationFlags, DeviceSample, DeviceVector, Finger, FingerPart, Gesture, HandEvent, HandEventPayload,
    HandSide, ManusError, TransportError,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::interaction::{AimState, InteractionTrigger, RenderSurface};

/// What a single [`HandSession::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A new sample was applied.
    Updated,
    /// The transport repeated the packet number of the last applied sample.
    Unchanged,
    /// The transport failed; the previous state was kept.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Unknown,
    Up,
    Down,
}

// ────────────────────────────────────────────────────────────────────────────
// HandSession
// ────────────────────────────────────────────────────────────────────────────

/// Live state of one tracked hand.
#[derive(Debug)]
pub struct HandSession {
    side: HandSide,
    hierarchy: BoneHierarchy,
    sample: Option<DeviceSample>,
    gesture: Gesture,
    link: Link,
    stale_frames: u64,
    events: Vec<HandEvent>,
}

impl HandSession {
    pub fn new(side: HandSide, hierarchy: BoneHierarchy) -> Self {
        Self {
            side,
            hierarchy,
            sample: None,
            gesture: Gesture::Default,
            link: Link::Unknown,
            stale_frames: 0,
            events: Vec::new(),
        }
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Last applied sample, `None` until the first successful poll.
    pub fn sample(&self) -> Option<&DeviceSample> {
        self.sample.as_ref()
    }

    pub fn hierarchy(&self) -> &BoneHierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut BoneHierarchy {
        &mut self.hierarchy
    }

    pub fn is_connected(&self) -> bool {
        self.link == Link::Up
    }

    /// Consecutive failed polls since the last successful one.
    pub fn stale_frames(&self) -> u64 {
        self.stale_frames
    }

    /// Fetch and apply one sample from `transport`.
    ///
    /// A failing transport never disturbs the current pose or gesture.  For
    /// transports that [stamp sequence numbers][DeviceTransport::stamps_sequence]
    /// a repeated packet number is reported as [`FrameOutcome::Unchanged`]
    /// and not applied again.
    pub fn poll(
        &mut self,
        transport: &mut dyn DeviceTransport,
        retargeter: &Retargeter,
    ) -> FrameOutcome {
        match transport.get_sample(self.side) {
            Ok(sample) => {
                let repeated = transport.stamps_sequence()
                    && self
                        .sample
                        .is_some_and(|last| last.sequence == sample.sequence);
                if repeated {
                    self.mark_alive();
                    return FrameOutcome::Unchanged;
                }
                let outcome = self.apply(sample, retargeter);
                if outcome == FrameOutcome::Updated
                    && retargeter.tracking() == TrackingMode::Positional
                {
                    match transport.get_skeletal(self.side) {
                        Ok(skeletal) => {
                            retargeter.apply_palm_pose(&skeletal.palm, &mut self.hierarchy)
                        }
                        Err(e) => trace!(hand = %self.side, error = %e, "no palm pose this frame"),
                    }
                }
                outcome
            }
            Err(e) => {
                self.mark_lost(e);
                FrameOutcome::Stale
            }
        }
    }

    /// Retarget and classify an already fetched sample.  Always returns
    /// [`FrameOutcome::Updated`].
    pub fn apply(&mut self, sample: DeviceSample, retargeter: &Retargeter) -> FrameOutcome {
        self.mark_alive();

        retargeter.retarget(&sample, &mut self.hierarchy);
        let gesture = classify(&sample.fingers);
        if gesture != self.gesture {
            debug!(hand = %self.side, from = %self.gesture, to = %gesture, "gesture changed");
            self.events.push(HandEvent::new(
                self.side,
                HandEventPayload::GestureChanged {
                    from: self.gesture,
                    to: gesture,
                },
            ));
            self.gesture = gesture;
        }
        self.sample = Some(sample);
        FrameOutcome::Updated
    }

    fn mark_alive(&mut self) {
        if self.link == Link::Down {
            info!(hand = %self.side, after_frames = self.stale_frames, "glove data restored");
            self.events
                .push(HandEvent::new(self.side, HandEventPayload::TransportRestored));
        }
        self.link = Link::Up;
        self.stale_frames = 0;
    }

    /// Device acceleration converted with [`vector_to_local`].  `None` until
    /// the first sample arrives.
    pub fn acceleration(&self) -> Option<Vec3> {
        self.sample.map(|s| vector_to_local(s.acceleration))
    }

    /// Device orientation as Euler angles in degrees, as reported.
    pub fn euler(&self) -> Option<DeviceVector> {
        self.sample.map(|s| s.euler)
    }

    fn mark_lost(&mut self, reason: TransportError) {
        self.stale_frames += 1;
        if self.link == Link::Down {
            trace!(hand = %self.side, frames = self.stale_frames, "still no glove data");
            return;
        }
        warn!(hand = %self.side, error = %reason, "glove data lost, keeping last pose");
        self.link = Link::Down;
        self.events.push(HandEvent::new(
            self.side,
            HandEventPayload::TransportLost { reason },
        ));
    }

    /// Ray from `part` of `finger` along the bone's world forward axis.
    ///
    /// # Errors
    ///
    /// Returns [`ManusError::NodeNotFound`] when the skeleton lacks the bone.
    pub fn finger_ray(&self, finger: Finger, part: FingerPart) -> Result<Ray, ManusError> {
        let bone = lookup_bone(&self.hierarchy, finger, part).ok_or_else(|| ManusError::NodeNotFound {
            path: bone_name(finger, part),
        })?;
        Ok(self.ray_from(bone))
    }

    /// Fingertip rays for every finger present in the skeleton.
    pub fn finger_rays(&self) -> Vec<(Finger, Ray)> {
        Finger::ALL
            .into_iter()
            .filter_map(|finger| {
                lookup_fingertip(&self.hierarchy, finger).map(|tip| (finger, self.ray_from(tip)))
            })
            .collect()
    }

    fn ray_from(&self, bone: BoneId) -> Ray {
        Ray::new(
            self.hierarchy.world_position(bone),
            self.hierarchy.world_forward(bone),
        )
    }

    /// Take the events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<HandEvent> {
        std::mem::take(&mut self.events)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GloveSession
// ────────────────────────────────────────────────────────────────────────────

/// Summary of one [`GloveSession::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub hands: Vec<(HandSide, FrameOutcome)>,
    pub aim: AimState,
}

/// Explicitly owned pipeline: transport, retargeter, hands and trigger.
pub struct GloveSession {
    transport: Box<dyn DeviceTransport>,
    retargeter: Retargeter,
    hands: BTreeMap<HandSide, HandSession>,
    trigger: InteractionTrigger,
    started: bool,
    frame: u64,
}

impl GloveSession {
    pub fn new(
        transport: Box<dyn DeviceTransport>,
        retargeter: Retargeter,
        interaction_hand: HandSide,
    ) -> Self {
        Self {
            transport,
            retargeter,
            hands: BTreeMap::new(),
            trigger: InteractionTrigger::new(interaction_hand),
            started: false,
            frame: 0,
        }
    }

    /// Initialise the transport.
    ///
    /// The session stays usable when this fails: every hand simply reports
    /// [`FrameOutcome::Stale`] until data arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ManusError::TransportUnavailable`] when the backend could
    /// not be initialised.
    pub fn start(&mut self) -> Result<(), ManusError> {
        let backend = self.transport.name().to_string();
        match self.transport.init() {
            Ok(()) => {
                self.started = true;
                info!(%backend, hands = self.hands.len(), "glove session started");
                Ok(())
            }
            Err(e) => {
                warn!(%backend, error = %e, "transport init failed, running without glove data");
                Err(e.into())
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn backend_name(&self) -> &str {
        self.transport.name()
    }

    /// Register a hand, replacing any previous session for `side`.
    pub fn add_hand(&mut self, side: HandSide, hierarchy: BoneHierarchy) -> &mut HandSession {
        debug!(hand = %side, bones = hierarchy.len(), "hand registered");
        let session = HandSession::new(side, hierarchy);
        match self.hands.entry(side) {
            Entry::Occupied(mut slot) => {
                slot.insert(session);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(session),
        }
    }

    pub fn hand(&self, side: HandSide) -> Option<&HandSession> {
        self.hands.get(&side)
    }

    pub fn hand_mut(&mut self, side: HandSide) -> Option<&mut HandSession> {
        self.hands.get_mut(&side)
    }

    pub fn trigger(&self) -> &InteractionTrigger {
        &self.trigger
    }

    pub fn retargeter(&self) -> &Retargeter {
        &self.retargeter
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Poll every hand, then update the interaction trigger.
    #[instrument(skip_all, fields(frame = self.frame + 1))]
    pub fn tick(&mut self, surface: &mut dyn RenderSurface) -> FrameReport {
        self.frame += 1;
        let mut hands = Vec::with_capacity(self.hands.len());
        for (side, hand) in self.hands.iter_mut() {
            let outcome = hand.poll(self.transport.as_mut(), &self.retargeter);
            hands.push((*side, outcome));
        }

        let aim = match self.hands.get(&self.trigger.hand()) {
            Some(hand) => self.trigger.update(hand, surface),
            None => {
                self.trigger.release(surface);
                AimState::Idle
            }
        };

        FrameReport {
            frame: self.frame,
            hands,
            aim,
        }
    }

    /// Drive the vibration motor of `side`.
    ///
    /// # Errors
    ///
    /// [`ManusError::TransportUnavailable`] carrying
    /// [`TransportError::OutOfRange`] for `power` outside `[0, 1]`, or any
    /// transport failure.
    pub fn vibrate(&mut self, side: HandSide, power: f32) -> Result<(), ManusError> {
        manus_hal::transport::check_power(power)?;
        self.transport.set_vibration(side, power)?;
        trace!(hand = %side, power, "vibration set");
        Ok(())
    }

    pub fn calibrate(&mut self, side: HandSide, flags: CalibrationFlags) -> Result<(), ManusError> {
        info!(hand = %side, ?flags, "calibrating glove");
        self.transport.calibrate(side, flags)?;
        Ok(())
    }

    pub fn set_handedness(&mut self, side: HandSide, right_hand: bool) -> Result<(), ManusError> {
        self.transport.set_handedness(side, right_hand)?;
        Ok(())
    }

    /// Events from every hand, left hand first.
    pub fn drain_events(&mut self) -> Vec<HandEvent> {
        self.hands
            .values_mut()
            .flat_map(HandSession::drain_events)
            .collect()
    }

    /// Stop haptics and close the transport.  Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<(), ManusError> {
        if !self.started {
            return Ok(());
        }
        for side in self.hands.keys().copied().collect::<Vec<_>>() {
            if let Err(e) = self.transport.set_vibration(side, 0.0) {
                debug!(hand = %side, error = %e, "could not stop vibration");
            }
        }
        self.started = false;
        self.transport.shutdown()?;
        info!(frames = self.frame, "glove session shut down");
        Ok(())
    }
}

impl std::fmt::Debug for GloveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GloveSession")
            .field("backend", &self.transport.name())
            .field("hands", &self.hands.keys().collect::<Vec<_>>())
            .field("trigger", &self.trigger)
            .field("started", &self.started)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Hit;
    use manus_hal::sim::{AfterScript, SimTransport};
    use manus_hal::bridge::{BridgeObject, BridgeTransport};
    use manus_perception::pose::PoseClip;
    use manus_types::DeviceQuaternion;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const OPEN: [f32; 5] = [0.0; 5];
    const POINT: [f32; 5] = [1.0, 0.0, 1.0, 1.0, 1.0];
    const FIST: [f32; 5] = [1.0; 5];

    fn retargeter() -> Retargeter {
        Retargeter::new(Box::new(PoseClip::default_curl()))
    }

    fn started_sim(samples: &[[f32; 5]]) -> SimTransport {
        let mut sim = SimTransport::builder()
            .with_samples(
                HandSide::Right,
                samples.iter().map(|f| DeviceSample::with_fingers(*f)),
            )
            .build();
        sim.init().unwrap();
        sim
    }

    fn right_hand() -> HandSession {
        HandSession::new(HandSide::Right, BoneHierarchy::standard_hand(HandSide::Right))
    }

    /// Records the last line request.
    #[derive(Default)]
    struct Floor {
        hit: Option<Hit>,
        line: Option<(bool, usize)>,
    }

    impl RenderSurface for Floor {
        fn raycast(&self, _ray: &Ray) -> Option<Hit> {
            self.hit
        }
        fn set_line(&mut self, visible: bool, points: &[Vec3]) {
            self.line = Some((visible, points.len()));
        }
    }

    /// Transport whose calls are visible from outside the boxed session.
    #[derive(Clone, Default)]
    struct SharedTransport {
        log: Arc<Mutex<Vec<String>>>,
        fail_init: bool,
    }

    impl DeviceTransport for SharedTransport {
        fn name(&self) -> &str {
            "shared"
        }
        fn init(&mut self) -> Result<(), TransportError> {
            self.log.lock().unwrap().push("init".into());
            if self.fail_init {
                Err(TransportError::Generic("no driver".into()))
            } else {
                Ok(())
            }
        }
        fn shutdown(&mut self) -> Result<(), TransportError> {
            self.log.lock().unwrap().push("shutdown".into());
            Ok(())
        }
        fn get_sample(&mut self, _hand: HandSide) -> Result<DeviceSample, TransportError> {
            Err(TransportError::NotConnected)
        }
        fn set_vibration(&mut self, hand: HandSide, power: f32) -> Result<(), TransportError> {
            self.log.lock().unwrap().push(format!("vibrate {hand} {power}"));
            Ok(())
        }
    }

    #[test]
    fn first_sample_updates_pose_and_gesture() {
        let mut sim = started_sim(&[FIST]);
        let mut hand = right_hand();

        assert_eq!(hand.poll(&mut sim, &retargeter()), FrameOutcome::Updated);
        assert_eq!(hand.gesture(), Gesture::Fist);
        assert_eq!(hand.sample().unwrap().sequence, 1);
        assert!(hand.is_connected());

        let events = hand.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].payload,
            HandEventPayload::GestureChanged {
                from: Gesture::Default,
                to: Gesture::Fist
            }
        );
        assert!(hand.drain_events().is_empty());
    }

    #[test]
    fn repeated_sequence_is_unchanged() {
        let mut sim = started_sim(&[POINT]);
        let mut hand = right_hand();
        let r = retargeter();

        assert_eq!(hand.poll(&mut sim, &r), FrameOutcome::Updated);
        // Script exhausted: the simulator repeats the last packet.
        assert_eq!(hand.poll(&mut sim, &r), FrameOutcome::Unchanged);
        assert_eq!(hand.gesture(), Gesture::Point);
    }

    /// Bridge object handing out queued 15-float packets, repeating the last.
    struct PacketBridge {
        packets: VecDeque<Vec<f32>>,
        last: Vec<f32>,
    }

    impl BridgeObject for PacketBridge {
        fn get_data(&mut self, _hand: i32) -> Vec<f32> {
            if let Some(next) = self.packets.pop_front() {
                self.last = next;
            }
            self.last.clone()
        }
        fn set_vibration(&mut self, _hand: i32, _power: f32) -> i32 {
            0
        }
        fn calibrate(&mut self, _hand: i32, _gyro: bool, _accel: bool, _fingers: bool) -> i32 {
            0
        }
        fn set_handedness(&mut self, _hand: i32, _right_hand: bool) -> i32 {
            0
        }
    }

    fn bridge_packet(fingers: [f32; 5]) -> Vec<f32> {
        let mut packet = vec![0.0; 10];
        packet[6] = 1.0; // quaternion w
        packet.extend(fingers);
        packet
    }

    fn started_bridge(packets: Vec<Vec<f32>>) -> BridgeTransport {
        let mut packets = Some(packets);
        let mut bridge = BridgeTransport::new(Box::new(move || {
            packets.take().map(|p| {
                Box::new(PacketBridge {
                    packets: p.into(),
                    last: Vec::new(),
                }) as Box<dyn BridgeObject>
            })
        }));
        bridge.init().unwrap();
        bridge
    }

    #[test]
    fn bridge_samples_without_sequence_are_all_applied() {
        let mut bridge = started_bridge(vec![bridge_packet(POINT), bridge_packet(FIST)]);
        let mut hand = right_hand();
        let r = retargeter();

        assert_eq!(hand.poll(&mut bridge, &r), FrameOutcome::Updated);
        assert_eq!(hand.gesture(), Gesture::Point);
        assert_eq!(hand.poll(&mut bridge, &r), FrameOutcome::Updated);
        assert_eq!(hand.gesture(), Gesture::Fist);
        // Same packet again is still applied; the bridge has no packet number.
        assert_eq!(hand.poll(&mut bridge, &r), FrameOutcome::Updated);
        assert_eq!(hand.gesture(), Gesture::Fist);
    }

    #[test]
    fn apply_ignores_sequence_numbers() {
        let mut hand = right_hand();
        let r = retargeter();
        hand.apply(DeviceSample::with_fingers(POINT), &r);
        assert_eq!(
            hand.apply(DeviceSample::with_fingers(FIST), &r),
            FrameOutcome::Updated
        );
        assert_eq!(hand.gesture(), Gesture::Fist);
    }

    #[test]
    fn nan_bend_does_not_panic() {
        let mut hand = right_hand();
        let r = retargeter();
        let outcome = hand.apply(
            DeviceSample::with_fingers([f32::NAN, 0.0, 1.0, 1.0, 1.0]),
            &r,
        );
        assert_eq!(outcome, FrameOutcome::Updated);
        // NaN compares false against every threshold.
        assert_eq!(hand.gesture(), Gesture::Default);
        let thumb_tip = lookup_fingertip(hand.hierarchy(), Finger::Thumb).unwrap();
        assert_eq!(
            hand.hierarchy().local_rotation(thumb_tip),
            manus_perception::Quaternion::identity()
        );
    }

    #[test]
    fn acceleration_is_converted_to_engine_space() {
        let mut hand = right_hand();
        assert!(hand.acceleration().is_none());
        let sample = DeviceSample {
            acceleration: DeviceVector::new(100.0, -200.0, 50.0),
            euler: DeviceVector::new(10.0, 20.0, 30.0),
            ..DeviceSample::default()
        };
        hand.apply(sample, &retargeter());
        assert_eq!(hand.acceleration(), Some(Vec3::new(-1.0, -2.0, 0.5)));
        assert_eq!(hand.euler(), Some(DeviceVector::new(10.0, 20.0, 30.0)));
    }

    #[test]
    fn failure_keeps_last_pose_and_gesture() {
        let mut sim = started_sim(&[POINT]);
        sim.push_failure(HandSide::Right, TransportError::Disconnected);
        let mut hand = right_hand();
        let r = retargeter();

        hand.poll(&mut sim, &r);
        let tip = lookup_fingertip(hand.hierarchy(), Finger::Index).unwrap();
        let before = hand.hierarchy().world_transform(tip);

        assert_eq!(hand.poll(&mut sim, &r), FrameOutcome::Stale);
        assert_eq!(hand.gesture(), Gesture::Point);
        assert_eq!(hand.hierarchy().world_transform(tip), before);
        assert!(!hand.is_connected());
        assert_eq!(hand.stale_frames(), 1);
    }

    #[test]
    fn outage_queues_lost_once_then_restored() {
        let mut sim = started_sim(&[OPEN]);
        sim.push_failure(HandSide::Right, TransportError::Disconnected);
        sim.push_failure(HandSide::Right, TransportError::Disconnected);
        sim.push_sample(HandSide::Right, DeviceSample::with_fingers(OPEN));
        let mut hand = right_hand();
        let r = retargeter();

        let outcomes: Vec<_> = (0..4).map(|_| hand.poll(&mut sim, &r)).collect();
        assert_eq!(
            outcomes,
            vec![
                FrameOutcome::Updated,
                FrameOutcome::Stale,
                FrameOutcome::Stale,
                FrameOutcome::Updated
            ]
        );

        let payloads: Vec<_> = hand.drain_events().into_iter().map(|e| e.payload).collect();
        assert_eq!(
            payloads,
            vec![
                HandEventPayload::TransportLost {
                    reason: TransportError::Disconnected
                },
                HandEventPayload::TransportRestored,
            ]
        );
    }

    #[test]
    fn never_connected_hand_reports_loss_once() {
        let mut sim = SimTransport::builder().build();
        sim.init().unwrap();
        let mut hand = right_hand();
        let r = retargeter();

        assert_eq!(hand.poll(&mut sim, &r), FrameOutcome::Stale);
        assert_eq!(hand.poll(&mut sim, &r), FrameOutcome::Stale);
        assert!(hand.sample().is_none());
        assert_eq!(hand.gesture(), Gesture::Default);
        assert_eq!(hand.drain_events().len(), 1);
    }

    #[test]
    fn positional_tracking_moves_wrist() {
        let mut sim = SimTransport::builder()
            .with_samples(HandSide::Right, [DeviceSample::default()])
            .with_palm_position(HandSide::Right, DeviceVector::new(0.0, 50.0, 0.0))
            .build();
        sim.init().unwrap();
        let mut hand = right_hand();
        let r = retargeter().with_tracking(TrackingMode::Positional);

        hand.poll(&mut sim, &r);
        let root = hand.hierarchy().root();
        assert_eq!(hand.hierarchy().local(root).translation, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn rotation_only_ignores_palm_position() {
        let mut sim = SimTransport::builder()
            .with_samples(HandSide::Right, [DeviceSample::default()])
            .with_palm_position(HandSide::Right, DeviceVector::new(0.0, 50.0, 0.0))
            .build();
        sim.init().unwrap();
        let mut hand = right_hand();

        hand.poll(&mut sim, &retargeter());
        let root = hand.hierarchy().root();
        assert_eq!(hand.hierarchy().local(root).translation, Vec3::zero());
    }

    #[test]
    fn finger_ray_follows_bone() {
        let mut hand = right_hand();
        hand.apply(DeviceSample::with_fingers(OPEN), &retargeter());

        let ray = hand.finger_ray(Finger::Index, FingerPart::Distal).unwrap();
        let tip = lookup_fingertip(hand.hierarchy(), Finger::Index).unwrap();
        assert_eq!(ray.origin, hand.hierarchy().world_position(tip));
        assert!((ray.direction.z - 1.0).abs() < 1e-5);
        assert_eq!(hand.finger_rays().len(), 5);
    }

    #[test]
    fn finger_ray_reports_missing_bone() {
        let hand = HandSession::new(HandSide::Left, BoneHierarchy::new("Hand"));
        let err = hand.finger_ray(Finger::Ring, FingerPart::Distal).unwrap_err();
        assert_eq!(
            err,
            ManusError::NodeNotFound {
                path: "Finger_33".into()
            }
        );
        assert!(hand.finger_rays().is_empty());
    }

    #[test]
    fn wrist_follows_device_orientation() {
        let mut hand = right_hand();
        let sample = DeviceSample {
            quaternion: DeviceQuaternion::new(0.0, 1.0, 0.0, 0.0),
            sequence: 7,
            ..DeviceSample::default()
        };
        hand.apply(sample, &retargeter());
        let root = hand.hierarchy().root();
        assert_eq!(
            hand.hierarchy().local_rotation(root),
            manus_perception::Quaternion::new(0.0, 1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn session_tick_polls_hands_and_aims() {
        let sim = SimTransport::builder()
            .with_samples(
                HandSide::Right,
                [POINT, FIST].map(DeviceSample::with_fingers),
            )
            .after_script(AfterScript::Disconnect)
            .build();
        let mut session = GloveSession::new(Box::new(sim), retargeter(), HandSide::Right);
        session.add_hand(HandSide::Right, BoneHierarchy::standard_hand(HandSide::Right));
        session.start().unwrap();

        let mut floor = Floor {
            hit: Some(Hit {
                point: Vec3::new(0.0, 0.0, 3.0),
                distance: 3.0,
            }),
            line: None,
        };

        let first = session.tick(&mut floor);
        assert_eq!(first.frame, 1);
        assert_eq!(first.hands, vec![(HandSide::Right, FrameOutcome::Updated)]);
        assert_eq!(first.aim, AimState::Aiming);
        assert_eq!(floor.line, Some((true, 2)));

        let second = session.tick(&mut floor);
        assert_eq!(second.aim, AimState::Idle);
        assert_eq!(floor.line, Some((false, 0)));

        let third = session.tick(&mut floor);
        assert_eq!(third.hands, vec![(HandSide::Right, FrameOutcome::Stale)]);
        assert_eq!(session.hand(HandSide::Right).unwrap().gesture(), Gesture::Fist);

        let events = session.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[2].payload,
            HandEventPayload::TransportLost { .. }
        ));
    }

    #[test]
    fn trigger_hand_missing_keeps_line_hidden() {
        let sim = started_sim(&[POINT]);
        let mut session = GloveSession::new(Box::new(sim), retargeter(), HandSide::Left);
        session.add_hand(HandSide::Right, BoneHierarchy::standard_hand(HandSide::Right));

        let mut floor = Floor::default();
        let report = session.tick(&mut floor);
        assert_eq!(report.aim, AimState::Idle);
        assert_eq!(floor.line, Some((false, 0)));
    }

    #[test]
    fn add_hand_replaces_existing_session() {
        let mut session = GloveSession::new(
            Box::new(SimTransport::builder().build()),
            retargeter(),
            HandSide::Right,
        );
        session.add_hand(HandSide::Right, BoneHierarchy::standard_hand(HandSide::Right));
        let hand = session.add_hand(HandSide::Right, BoneHierarchy::new("Stub"));
        assert_eq!(hand.hierarchy().len(), 1);
        assert!(session.hand(HandSide::Left).is_none());
        assert!(session.hand_mut(HandSide::Right).is_some());
    }

    #[test]
    fn failed_start_is_reported_but_session_runs() {
        let transport = SharedTransport {
            fail_init: true,
            ..SharedTransport::default()
        };
        let mut session = GloveSession::new(Box::new(transport), retargeter(), HandSide::Right);
        session.add_hand(HandSide::Right, BoneHierarchy::standard_hand(HandSide::Right));

        assert!(matches!(
            session.start(),
            Err(ManusError::TransportUnavailable(TransportError::Generic(_)))
        ));
        assert!(!session.is_started());
        let report = session.tick(&mut Floor::default());
        assert_eq!(report.hands, vec![(HandSide::Right, FrameOutcome::Stale)]);
    }

    #[test]
    fn vibrate_validates_power() {
        let transport = SharedTransport::default();
        let log = transport.log.clone();
        let mut session = GloveSession::new(Box::new(transport), retargeter(), HandSide::Right);

        session.vibrate(HandSide::Left, 0.5).unwrap();
        assert_eq!(
            session.vibrate(HandSide::Left, 1.5),
            Err(ManusError::TransportUnavailable(TransportError::OutOfRange))
        );
        assert_eq!(log.lock().unwrap().as_slice(), ["vibrate left 0.5"]);
    }

    #[test]
    fn unsupported_calibration_is_an_error() {
        let mut session = GloveSession::new(
            Box::new(SharedTransport::default()),
            retargeter(),
            HandSide::Right,
        );
        assert!(matches!(
            session.calibrate(HandSide::Right, CalibrationFlags::default()),
            Err(ManusError::TransportUnavailable(TransportError::Generic(_)))
        ));
    }

    #[test]
    fn shutdown_stops_haptics_once() {
        let transport = SharedTransport::default();
        let log = transport.log.clone();
        let mut session = GloveSession::new(Box::new(transport), retargeter(), HandSide::Right);
        session.add_hand(HandSide::Right, BoneHierarchy::standard_hand(HandSide::Right));
        session.start().unwrap();

        session.shutdown().unwrap();
        session.shutdown().unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["init", "vibrate right 0", "shutdown"]
        );
    }
}
