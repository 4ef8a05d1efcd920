//! MQTT 3.1.1 wire codec
//!
//! A WebSocket frame may carry part of a packet or several packets, so
//! decoding works on an accumulating buffer and leaves incomplete packets in
//! place until more bytes arrive.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::{ProtocolError, ProtocolResult};
use super::packet::{
    ConnAck, Connect, ConnectReturnCode, LastWill, Packet, Publish, QoS, SubAck, SubAckCode,
    Subscribe, SubscribeFilter, Unsubscribe, PROTOCOL_LEVEL_V31, PROTOCOL_LEVEL_V311,
};

/// Default upper bound on a single packet, fixed header included
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1024 * 1024;

/// Largest value a four-byte remaining length can carry
const MAX_REMAINING_LENGTH: usize = 268_435_455;

// Control packet types (upper nibble of the fixed header)
const CONNECT: u8 = 1;
const CONNACK: u8 = 2;
const PUBLISH: u8 = 3;
const PUBACK: u8 = 4;
const PUBREC: u8 = 5;
const PUBREL: u8 = 6;
const PUBCOMP: u8 = 7;
const SUBSCRIBE: u8 = 8;
const SUBACK: u8 = 9;
const UNSUBSCRIBE: u8 = 10;
const UNSUBACK: u8 = 11;
const PINGREQ: u8 = 12;
const PINGRESP: u8 = 13;
const DISCONNECT: u8 = 14;

// CONNECT flag bits
const FLAG_RESERVED: u8 = 0x01;
const FLAG_CLEAN_SESSION: u8 = 0x02;
const FLAG_WILL: u8 = 0x04;
const FLAG_WILL_RETAIN: u8 = 0x20;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_USERNAME: u8 = 0x80;

/// Stateless MQTT packet encoder and decoder
#[derive(Debug, Clone, Copy)]
pub struct MqttCodec {
    max_packet_size: usize,
}

impl Default for MqttCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACKET_SIZE)
    }
}

impl MqttCodec {
    pub fn new(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Decode one packet from the front of `buf`
    ///
    /// Returns `Ok(None)` when `buf` does not yet hold a complete packet. On
    /// success the packet's bytes are consumed from `buf`.
    pub fn decode(&self, buf: &mut BytesMut) -> ProtocolResult<Option<Packet>> {
        if buf.len() < 2 {
            return Ok(None);
        }

        let Some((remaining, length_bytes)) = read_remaining_length(&buf[1..])? else {
            return Ok(None);
        };

        let total = 1 + length_bytes + remaining;
        if total > self.max_packet_size {
            return Err(ProtocolError::PacketTooLarge {
                size: total,
                max: self.max_packet_size,
            });
        }
        if buf.len() < total {
            buf.reserve(total - buf.len());
            return Ok(None);
        }

        let header = buf[0];
        let mut body = buf.split_to(total).freeze();
        body.advance(1 + length_bytes);

        decode_packet(header, body).map(Some)
    }

    /// Append the encoding of `packet` to `dst`
    pub fn encode(&self, packet: &Packet, dst: &mut BytesMut) -> ProtocolResult<()> {
        let mut body = BytesMut::new();

        let header = match packet {
            Packet::Connect(connect) => {
                encode_connect(connect, &mut body)?;
                CONNECT << 4
            }
            Packet::ConnAck(ack) => {
                body.put_u8(u8::from(ack.session_present));
                body.put_u8(ack.code as u8);
                CONNACK << 4
            }
            Packet::Publish(publish) => {
                put_string(&mut body, &publish.topic)?;
                if publish.qos != QoS::AtMostOnce {
                    let id = publish.packet_id.ok_or(ProtocolError::ZeroPacketId)?;
                    put_packet_id(&mut body, id)?;
                }
                body.extend_from_slice(&publish.payload);
                (PUBLISH << 4)
                    | (u8::from(publish.dup) << 3)
                    | (publish.qos.as_u8() << 1)
                    | u8::from(publish.retain)
            }
            Packet::PubAck(id) => {
                put_packet_id(&mut body, *id)?;
                PUBACK << 4
            }
            Packet::Subscribe(subscribe) => {
                put_packet_id(&mut body, subscribe.packet_id)?;
                for entry in &subscribe.filters {
                    put_string(&mut body, &entry.filter)?;
                    body.put_u8(entry.requested_qos);
                }
                (SUBSCRIBE << 4) | 0b0010
            }
            Packet::SubAck(ack) => {
                put_packet_id(&mut body, ack.packet_id)?;
                for code in &ack.codes {
                    body.put_u8(code.as_u8());
                }
                SUBACK << 4
            }
            Packet::Unsubscribe(unsubscribe) => {
                put_packet_id(&mut body, unsubscribe.packet_id)?;
                for filter in &unsubscribe.filters {
                    put_string(&mut body, filter)?;
                }
                (UNSUBSCRIBE << 4) | 0b0010
            }
            Packet::UnsubAck(id) => {
                put_packet_id(&mut body, *id)?;
                UNSUBACK << 4
            }
            Packet::PingReq => PINGREQ << 4,
            Packet::PingResp => PINGRESP << 4,
            Packet::Disconnect => DISCONNECT << 4,
        };

        if body.len() > MAX_REMAINING_LENGTH {
            return Err(ProtocolError::PacketTooLarge {
                size: body.len(),
                max: MAX_REMAINING_LENGTH,
            });
        }

        dst.reserve(body.len() + 5);
        dst.put_u8(header);
        write_remaining_length(dst, body.len());
        dst.extend_from_slice(&body);
        Ok(())
    }
}

/// Parse the variable-length remaining length field
///
/// Returns the value and the number of bytes it occupied, or `None` if the
/// field is not complete yet.
fn read_remaining_length(bytes: &[u8]) -> ProtocolResult<Option<(usize, usize)>> {
    let mut value = 0usize;
    let mut multiplier = 1usize;

    for (i, byte) in bytes.iter().enumerate() {
        if i == 4 {
            return Err(ProtocolError::MalformedRemainingLength);
        }
        value += usize::from(byte & 0x7F) * multiplier;
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
        multiplier *= 128;
    }

    if bytes.len() >= 4 {
        Err(ProtocolError::MalformedRemainingLength)
    } else {
        Ok(None)
    }
}

fn write_remaining_length(dst: &mut BytesMut, mut len: usize) {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        dst.put_u8(byte);
        if len == 0 {
            break;
        }
    }
}

fn decode_packet(header: u8, mut body: Bytes) -> ProtocolResult<Packet> {
    let packet_type = header >> 4;
    let flags = header & 0x0F;

    let packet = match packet_type {
        CONNECT => {
            expect_flags("CONNECT", flags, 0)?;
            Packet::Connect(decode_connect(&mut body)?)
        }
        CONNACK => {
            expect_flags("CONNACK", flags, 0)?;
            let ack_flags = read_u8(&mut body, "CONNACK flags")?;
            let code = ConnectReturnCode::from_u8(read_u8(&mut body, "CONNACK return code")?)?;
            Packet::ConnAck(ConnAck {
                session_present: ack_flags & 0x01 != 0,
                code,
            })
        }
        PUBLISH => {
            let publish = decode_publish(flags, &mut body)?;
            // the payload takes the rest of the body
            return Ok(Packet::Publish(publish));
        }
        PUBACK => {
            expect_flags("PUBACK", flags, 0)?;
            Packet::PubAck(read_packet_id(&mut body, "PUBACK")?)
        }
        PUBREC | PUBREL | PUBCOMP => {
            return Err(ProtocolError::UnsupportedPacket("QoS 2 acknowledgement"));
        }
        SUBSCRIBE => {
            expect_flags("SUBSCRIBE", flags, 0b0010)?;
            Packet::Subscribe(decode_subscribe(&mut body)?)
        }
        SUBACK => {
            expect_flags("SUBACK", flags, 0)?;
            let packet_id = read_packet_id(&mut body, "SUBACK")?;
            let mut codes = Vec::with_capacity(body.remaining());
            while body.has_remaining() {
                codes.push(match body.get_u8() {
                    SubAckCode::FAILURE => SubAckCode::Failure,
                    qos => SubAckCode::Granted(QoS::from_u8(qos)?),
                });
            }
            Packet::SubAck(SubAck { packet_id, codes })
        }
        UNSUBSCRIBE => {
            expect_flags("UNSUBSCRIBE", flags, 0b0010)?;
            let packet_id = read_packet_id(&mut body, "UNSUBSCRIBE")?;
            let mut filters = Vec::new();
            while body.has_remaining() {
                filters.push(read_string(&mut body, "UNSUBSCRIBE topic filter")?);
            }
            if filters.is_empty() {
                return Err(ProtocolError::EmptyFilterList("UNSUBSCRIBE"));
            }
            Packet::Unsubscribe(Unsubscribe { packet_id, filters })
        }
        UNSUBACK => {
            expect_flags("UNSUBACK", flags, 0)?;
            Packet::UnsubAck(read_packet_id(&mut body, "UNSUBACK")?)
        }
        PINGREQ => {
            expect_flags("PINGREQ", flags, 0)?;
            Packet::PingReq
        }
        PINGRESP => {
            expect_flags("PINGRESP", flags, 0)?;
            Packet::PingResp
        }
        DISCONNECT => {
            expect_flags("DISCONNECT", flags, 0)?;
            Packet::Disconnect
        }
        other => return Err(ProtocolError::UnknownPacketType(other)),
    };

    if body.has_remaining() {
        return Err(ProtocolError::TrailingBytes(packet.name()));
    }
    Ok(packet)
}

fn decode_connect(body: &mut Bytes) -> ProtocolResult<Connect> {
    let protocol_name = read_string(body, "protocol name")?;
    if protocol_name != "MQTT" && protocol_name != "MQIsdp" {
        return Err(ProtocolError::InvalidProtocolName(protocol_name));
    }

    let protocol_level = read_u8(body, "protocol level")?;
    if protocol_level != PROTOCOL_LEVEL_V31 && protocol_level != PROTOCOL_LEVEL_V311 {
        // later layouts (MQTT 5 properties) are not parsed; the session refuses the level
        body.advance(body.remaining());
        return Ok(Connect {
            protocol_level,
            client_id: String::new(),
            clean_session: false,
            keep_alive: 0,
            will: None,
            username: None,
            password: None,
        });
    }

    let flags = read_u8(body, "connect flags")?;
    if flags & FLAG_RESERVED != 0 {
        return Err(ProtocolError::MalformedConnectFlags("reserved bit set"));
    }
    let keep_alive = read_u16(body, "keep alive")?;
    let client_id = read_string(body, "client identifier")?;

    let will = if flags & FLAG_WILL != 0 {
        let qos = QoS::from_u8((flags >> 3) & 0x03)?;
        let topic = read_string(body, "will topic")?;
        let payload = read_binary(body, "will message")?;
        Some(LastWill {
            topic,
            payload,
            qos,
            retain: flags & FLAG_WILL_RETAIN != 0,
        })
    } else {
        if flags & 0x38 != 0 {
            return Err(ProtocolError::MalformedConnectFlags(
                "will QoS or retain set without will flag",
            ));
        }
        None
    };

    let username = if flags & FLAG_USERNAME != 0 {
        Some(read_string(body, "user name")?)
    } else {
        None
    };

    let password = if flags & FLAG_PASSWORD != 0 {
        if username.is_none() {
            return Err(ProtocolError::MalformedConnectFlags(
                "password flag set without user name",
            ));
        }
        Some(read_binary(body, "password")?)
    } else {
        None
    };

    Ok(Connect {
        protocol_level,
        client_id,
        clean_session: flags & FLAG_CLEAN_SESSION != 0,
        keep_alive,
        will,
        username,
        password,
    })
}

fn decode_publish(flags: u8, body: &mut Bytes) -> ProtocolResult<Publish> {
    let qos = QoS::from_u8((flags >> 1) & 0x03)?;
    let topic = read_string(body, "PUBLISH topic name")?;
    let packet_id = match qos {
        QoS::AtMostOnce => None,
        QoS::AtLeastOnce => Some(read_packet_id(body, "PUBLISH")?),
    };

    Ok(Publish {
        dup: flags & 0x08 != 0,
        qos,
        retain: flags & 0x01 != 0,
        topic,
        packet_id,
        payload: body.split_to(body.len()),
    })
}

fn decode_subscribe(body: &mut Bytes) -> ProtocolResult<Subscribe> {
    let packet_id = read_packet_id(body, "SUBSCRIBE")?;

    let mut filters = Vec::new();
    while body.has_remaining() {
        let filter = read_string(body, "SUBSCRIBE topic filter")?;
        let options = read_u8(body, "requested QoS")?;
        if options > 2 {
            return Err(ProtocolError::UnsupportedQos(options));
        }
        filters.push(SubscribeFilter {
            filter,
            requested_qos: options,
        });
    }

    if filters.is_empty() {
        return Err(ProtocolError::EmptyFilterList("SUBSCRIBE"));
    }
    Ok(Subscribe { packet_id, filters })
}

fn encode_connect(connect: &Connect, body: &mut BytesMut) -> ProtocolResult<()> {
    let protocol_name = if connect.protocol_level == PROTOCOL_LEVEL_V31 {
        "MQIsdp"
    } else {
        "MQTT"
    };
    put_string(body, protocol_name)?;
    body.put_u8(connect.protocol_level);

    let mut flags = 0u8;
    if connect.clean_session {
        flags |= FLAG_CLEAN_SESSION;
    }
    if let Some(will) = &connect.will {
        flags |= FLAG_WILL | (will.qos.as_u8() << 3);
        if will.retain {
            flags |= FLAG_WILL_RETAIN;
        }
    }
    if connect.username.is_some() {
        flags |= FLAG_USERNAME;
    }
    if connect.password.is_some() {
        flags |= FLAG_PASSWORD;
    }
    body.put_u8(flags);
    body.put_u16(connect.keep_alive);

    put_string(body, &connect.client_id)?;
    if let Some(will) = &connect.will {
        put_string(body, &will.topic)?;
        put_binary(body, &will.payload)?;
    }
    if let Some(username) = &connect.username {
        put_string(body, username)?;
    }
    if let Some(password) = &connect.password {
        put_binary(body, password)?;
    }
    Ok(())
}

fn expect_flags(packet: &'static str, flags: u8, expected: u8) -> ProtocolResult<()> {
    if flags == expected {
        Ok(())
    } else {
        Err(ProtocolError::InvalidFlags { packet, flags })
    }
}

fn read_u8(buf: &mut Bytes, field: &'static str) -> ProtocolResult<u8> {
    if !buf.has_remaining() {
        return Err(ProtocolError::Truncated(field));
    }
    Ok(buf.get_u8())
}

fn read_u16(buf: &mut Bytes, field: &'static str) -> ProtocolResult<u16> {
    if buf.remaining() < 2 {
        return Err(ProtocolError::Truncated(field));
    }
    Ok(buf.get_u16())
}

fn read_packet_id(buf: &mut Bytes, packet: &'static str) -> ProtocolResult<u16> {
    match read_u16(buf, packet)? {
        0 => Err(ProtocolError::ZeroPacketId),
        id => Ok(id),
    }
}

fn read_binary(buf: &mut Bytes, field: &'static str) -> ProtocolResult<Bytes> {
    let len = usize::from(read_u16(buf, field)?);
    if buf.remaining() < len {
        return Err(ProtocolError::Truncated(field));
    }
    Ok(buf.split_to(len))
}

fn read_string(buf: &mut Bytes, field: &'static str) -> ProtocolResult<String> {
    let raw = read_binary(buf, field)?;
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

fn put_binary(buf: &mut BytesMut, data: &[u8]) -> ProtocolResult<()> {
    let len = u16::try_from(data.len()).map_err(|_| ProtocolError::StringTooLong(data.len()))?;
    buf.put_u16(len);
    buf.extend_from_slice(data);
    Ok(())
}

fn put_string(buf: &mut BytesMut, value: &str) -> ProtocolResult<()> {
    put_binary(buf, value.as_bytes())
}

fn put_packet_id(buf: &mut BytesMut, id: u16) -> ProtocolResult<()> {
    if id == 0 {
        return Err(ProtocolError::ZeroPacketId);
    }
    buf.put_u16(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(packet: &Packet) -> BytesMut {
        let mut buf = BytesMut::new();
        MqttCodec::default().encode(packet, &mut buf).unwrap();
        buf
    }

    fn decode_all(bytes: &[u8]) -> ProtocolResult<Option<Packet>> {
        let mut buf = BytesMut::from(bytes);
        MqttCodec::default().decode(&mut buf)
    }

    #[test]
    fn test_decode_client_connect() {
        // CONNECT as sent by mqtt.js: "MQTT" level 4, clean session, keep alive 60, id "dev1"
        let bytes = [
            0x10, 0x10, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x00, 0x3C, 0x00, 0x04,
            b'd', b'e', b'v', b'1',
        ];

        let packet = decode_all(&bytes).unwrap().unwrap();
        match packet {
            Packet::Connect(connect) => {
                assert_eq!(connect.protocol_level, 4);
                assert_eq!(connect.client_id, "dev1");
                assert!(connect.clean_session);
                assert_eq!(connect.keep_alive, 60);
                assert!(connect.will.is_none());
            }
            other => panic!("expected CONNECT, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_with_will_and_credentials() {
        let connect = Connect {
            will: Some(LastWill {
                topic: "devices/dev1/state".to_string(),
                payload: Bytes::from_static(b"offline"),
                qos: QoS::AtLeastOnce,
                retain: true,
            }),
            username: Some("operator".to_string()),
            password: Some(Bytes::from_static(b"secret")),
            ..Connect::new("dev1")
        };

        let mut buf = encode(&Packet::Connect(connect.clone()));
        let decoded = MqttCodec::default().decode(&mut buf).unwrap();

        assert_eq!(decoded, Some(Packet::Connect(connect)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_connack_bytes() {
        let ack = Packet::ConnAck(ConnAck {
            session_present: false,
            code: ConnectReturnCode::Accepted,
        });
        assert_eq!(&encode(&ack)[..], &[0x20, 0x02, 0x00, 0x00]);

        let refused = Packet::ConnAck(ConnAck {
            session_present: false,
            code: ConnectReturnCode::UnacceptableProtocolVersion,
        });
        assert_eq!(&encode(&refused)[..], &[0x20, 0x02, 0x00, 0x01]);
    }

    #[test]
    fn test_encode_suback_with_failure() {
        let ack = Packet::SubAck(SubAck {
            packet_id: 7,
            codes: vec![SubAckCode::Granted(QoS::AtLeastOnce), SubAckCode::Failure],
        });
        assert_eq!(&encode(&ack)[..], &[0x90, 0x04, 0x00, 0x07, 0x01, 0x80]);
    }

    #[test]
    fn test_encode_qos1_publish_flags() {
        let publish = Packet::Publish(Publish {
            qos: QoS::AtLeastOnce,
            retain: true,
            packet_id: Some(1),
            ..Publish::new("a/b", &b"hi"[..])
        });
        let bytes = encode(&publish);
        assert_eq!(bytes[0], 0x33);
        assert_eq!(&bytes[2..7], &[0x00, 0x03, b'a', b'/', b'b']);
        assert_eq!(&bytes[7..9], &[0x00, 0x01]);
        assert_eq!(&bytes[9..], b"hi");
    }

    #[test]
    fn test_partial_packet_waits_for_more_bytes() {
        let full = encode(&Packet::Publish(Publish::new("devices/status", &b"{}"[..])));
        let codec = MqttCodec::default();

        let mut buf = BytesMut::from(&full[..5]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 5);

        buf.extend_from_slice(&full[5..]);
        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(Packet::Publish(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_two_packets_in_one_chunk() {
        let mut buf = encode(&Packet::PingReq);
        buf.extend_from_slice(&encode(&Packet::Disconnect));

        let codec = MqttCodec::default();
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Packet::PingReq));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Packet::Disconnect));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_multi_byte_remaining_length() {
        let payload = vec![b'x'; 300];
        let bytes = encode(&Packet::Publish(Publish::new("t", payload.clone())));
        // 2 (topic len) + 1 (topic) + 300 = 303 = 0xAF 0x02
        assert_eq!(&bytes[1..3], &[0xAF, 0x02]);

        match decode_all(&bytes).unwrap() {
            Some(Packet::Publish(publish)) => assert_eq!(publish.payload.len(), 300),
            other => panic!("expected PUBLISH, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_remaining_length() {
        let bytes = [0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(
            decode_all(&bytes),
            Err(ProtocolError::MalformedRemainingLength)
        );
    }

    #[test]
    fn test_packet_too_large() {
        let codec = MqttCodec::new(16);
        let mut buf = encode(&Packet::Publish(Publish::new("t", vec![0u8; 64])));

        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::PacketTooLarge { max: 16, .. })
        ));
    }

    #[test]
    fn test_qos2_publish_rejected() {
        let bytes = [0x34, 0x05, 0x00, 0x01, b't', 0x00, 0x01];
        assert_eq!(decode_all(&bytes), Err(ProtocolError::UnsupportedQos(2)));
    }

    #[test]
    fn test_qos2_flow_packets_rejected() {
        let pubrel = [0x62, 0x02, 0x00, 0x01];
        assert!(matches!(
            decode_all(&pubrel),
            Err(ProtocolError::UnsupportedPacket(_))
        ));
    }

    #[test]
    fn test_subscribe_flags_checked() {
        let bytes = [0x80, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x00];
        assert_eq!(
            decode_all(&bytes),
            Err(ProtocolError::InvalidFlags {
                packet: "SUBSCRIBE",
                flags: 0
            })
        );
    }

    #[test]
    fn test_subscribe_keeps_requested_qos2() {
        let bytes = [0x82, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x02];
        match decode_all(&bytes).unwrap() {
            Some(Packet::Subscribe(subscribe)) => {
                assert_eq!(subscribe.packet_id, 1);
                assert_eq!(subscribe.filters[0].filter, "a");
                assert_eq!(subscribe.filters[0].requested_qos, 2);
            }
            other => panic!("expected SUBSCRIBE, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_subscribe_rejected() {
        let bytes = [0x82, 0x02, 0x00, 0x01];
        assert_eq!(
            decode_all(&bytes),
            Err(ProtocolError::EmptyFilterList("SUBSCRIBE"))
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0x30, 0x04, 0x00, 0x02, 0xC3, 0x28];
        assert_eq!(decode_all(&bytes), Err(ProtocolError::InvalidUtf8));
    }

    #[test]
    fn test_unknown_packet_type() {
        assert_eq!(
            decode_all(&[0xF0, 0x00]),
            Err(ProtocolError::UnknownPacketType(15))
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(
            decode_all(&[0xC0, 0x01, 0x00]),
            Err(ProtocolError::TrailingBytes("PINGREQ"))
        );
    }

    #[test]
    fn test_bad_protocol_name() {
        let bytes = [
            0x10, 0x0C, 0x00, 0x04, b'H', b'T', b'T', b'P', 0x04, 0x02, 0x00, 0x3C, 0x00, 0x00,
        ];
        assert_eq!(
            decode_all(&bytes),
            Err(ProtocolError::InvalidProtocolName("HTTP".to_string()))
        );
    }

    #[test]
    fn test_mqtt5_connect_keeps_level_only() {
        // CONNECT as sent by mqtt.js v5: level 5, clean start, keep alive 60,
        // empty properties, id "dev1"
        let bytes = [
            0x10, 0x11, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x05, 0x02, 0x00, 0x3C, 0x00, 0x00,
            0x04, b'd', b'e', b'v', b'1',
        ];

        match decode_all(&bytes).unwrap().unwrap() {
            Packet::Connect(connect) => {
                assert_eq!(connect.protocol_level, 5);
                assert!(connect.client_id.is_empty());
                assert!(connect.will.is_none());
            }
            other => panic!("expected CONNECT, got {other:?}"),
        }
    }
}
