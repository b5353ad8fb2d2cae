//! SNMPv2c over UDP, backed by the `snmp` crate.

use snmp::{SnmpError, SnmpPdu, SyncSession, Value};
use tracing::debug;

use crate::config::CheckConfig;
use crate::oid::Oid;
use crate::session::{SnmpSession, TableRow, TableWalk, TransportError, VarBind};
use crate::value::SnmpValue;

/// A v2c session to one agent.
///
/// Every walk opens its own socket on the walk's producer thread, so a GET can be issued
/// while a walk is still being consumed.
pub struct UdpSession {
    address: String,
    community: Vec<u8>,
    timeout: std::time::Duration,
    session: SyncSession,
}

impl UdpSession {
    pub fn connect(config: &CheckConfig) -> Result<UdpSession, TransportError> {
        let address = config.agent_address();
        let community = config.community.as_bytes().to_vec();
        let session = SyncSession::new(address.as_str(), &community, Some(config.timeout), 0)?;
        debug!(%address, timeout = ?config.timeout, "session opened");
        Ok(UdpSession {
            address,
            community,
            timeout: config.timeout,
            session,
        })
    }

    fn open(&self) -> Result<SyncSession, TransportError> {
        Ok(SyncSession::new(
            self.address.as_str(),
            &self.community,
            Some(self.timeout),
            0,
        )?)
    }
}

impl SnmpSession for UdpSession {
    fn walk(&mut self, base: &Oid) -> Result<TableWalk, TransportError> {
        let mut session = self.open()?;
        let subtree = base.clone();
        let mut cursor = base.clone();

        TableWalk::spawn(base, move || {
            let next = {
                let pdu = session.getnext(cursor.segments()).map_err(snmp_error)?;
                first_varbind(pdu)?
            };
            match next {
                Some((oid, value)) if oid.is_below(&subtree) && oid > cursor => {
                    cursor = oid.clone();
                    Ok(Some(TableRow::new(oid, value)))
                }
                // left the subtree, end of MIB, or an agent going backwards
                _ => Ok(None),
            }
        })
    }

    fn get(&mut self, oid: &Oid) -> Result<Vec<VarBind>, TransportError> {
        debug!(%oid, "get");
        let pdu = self.session.get(oid.segments()).map_err(snmp_error)?;
        check_status(&pdu)?;

        let mut binds = Vec::new();
        for (name, value) in pdu.varbinds {
            binds.push(VarBind {
                oid: read_oid(&name)?,
                value: convert(value)?,
            });
        }
        Ok(binds)
    }
}

fn check_status(pdu: &SnmpPdu<'_>) -> Result<(), TransportError> {
    if pdu.error_status != 0 {
        return Err(TransportError::Agent {
            status: pdu.error_status,
            index: pdu.error_index,
        });
    }
    Ok(())
}

fn first_varbind(mut pdu: SnmpPdu<'_>) -> Result<Option<(Oid, SnmpValue)>, TransportError> {
    check_status(&pdu)?;
    match pdu.varbinds.next() {
        Some((name, value)) => Ok(Some((read_oid(&name)?, convert(value)?))),
        None => Ok(None),
    }
}

fn read_oid(name: &snmp::ObjectIdentifier<'_>) -> Result<Oid, TransportError> {
    let mut buf = [0u32; 128];
    let segments = name.read_name(&mut buf).map_err(snmp_error)?;
    Ok(Oid::from(segments))
}

/// Maps a wire value to a scalar.
///
/// The decoder stops at a varbind whose type it does not know, which includes the v2c
/// exceptions (`noSuchObject`, `noSuchInstance`, `endOfMibView`). Those never get here: the
/// response just carries fewer varbinds, so a missing column reads as an empty GET and an
/// exhausted MIB ends the walk.
fn convert(value: Value<'_>) -> Result<SnmpValue, TransportError> {
    let value = match value {
        Value::Integer(n) => SnmpValue::Integer(n),
        Value::Counter32(n) => SnmpValue::Counter32(n),
        Value::Unsigned32(n) => SnmpValue::Unsigned32(n),
        Value::Counter64(n) => SnmpValue::Counter64(n),
        Value::Timeticks(n) => SnmpValue::Timeticks(n),
        Value::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
        Value::Opaque(bytes) => SnmpValue::Opaque(bytes.to_vec()),
        Value::ObjectIdentifier(oid) => SnmpValue::ObjectId(read_oid(&oid)?),
        Value::IpAddress(addr) => SnmpValue::IpAddress(addr),
        Value::Boolean(b) => SnmpValue::Boolean(b),
        Value::Null => SnmpValue::Null,
        other => {
            return Err(TransportError::Snmp(format!(
                "unsupported value in response: {:?}",
                other
            )))
        }
    };
    Ok(value)
}

fn snmp_error(err: SnmpError) -> TransportError {
    match err {
        SnmpError::ReceiveError => TransportError::Snmp("no response from agent".to_owned()),
        SnmpError::SendError => TransportError::Snmp("failed to send request".to_owned()),
        other => TransportError::Snmp(format!("{:?}", other)),
    }
}
